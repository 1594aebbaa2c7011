//! In-memory inventory used by tests.
//!
//! [`InMemoryInventory`] implements both [`InventoryBackend`] and
//! [`ChangeFeed`]: every write emits the same notification the PostgreSQL
//! trigger would, so a [`RealtimeFanout`](dealer_events::RealtimeFanout)
//! can be driven end to end without a database. It also counts reads per
//! floor and can delay or refuse them.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dealer_core::error::CoreError;
use dealer_core::floors::{validate_receive_destination, Floor};
use dealer_core::types::DbId;
use dealer_db::models::car::{Car, CreateCar};
use dealer_db::models::ordered_car::{CreateOrderedCar, OrderedCar};
use dealer_events::change::{CarRef, ChangeKind, ChangeNotification};
use dealer_events::feed::{ChangeFeed, ChangeStream, FeedError};
use futures::StreamExt;
use tokio::sync::broadcast;

use crate::backend::InventoryBackend;
use crate::error::InventoryError;

#[derive(Default)]
struct State {
    next_car_id: DbId,
    next_order_id: DbId,
    cars: BTreeMap<DbId, Car>,
    orders: BTreeMap<DbId, OrderedCar>,
}

/// Test double for the inventory backend and its change feed.
pub struct InMemoryInventory {
    state: Mutex<State>,
    changes: broadcast::Sender<ChangeNotification>,
    list_calls: Mutex<HashMap<Floor, usize>>,
    read_delays: Mutex<HashMap<Floor, Duration>>,
    write_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventory {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(State::default()),
            changes,
            list_calls: Mutex::new(HashMap::new()),
            read_delays: Mutex::new(HashMap::new()),
            write_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert a car without emitting a change notification.
    pub fn seed_car(&self, vin: &str, model: &str, floor: Floor) -> Car {
        let mut state = self.lock_state();
        let car = new_car(&mut state, vin, model, floor);
        state.cars.insert(car.id, car.clone());
        car
    }

    /// Insert a car with every attribute supplied by `edit`, without
    /// emitting a change notification.
    pub fn seed_car_with(&self, vin: &str, floor: Floor, edit: impl FnOnce(&mut Car)) -> Car {
        let mut state = self.lock_state();
        let mut car = new_car(&mut state, vin, "Model S", floor);
        edit(&mut car);
        state.cars.insert(car.id, car.clone());
        car
    }

    /// Insert a pending order without emitting a change notification.
    pub fn seed_order(&self, vin: &str, model: &str) -> OrderedCar {
        let mut state = self.lock_state();
        state.next_order_id += 1;
        let now = Utc::now();
        let order = OrderedCar {
            id: state.next_order_id,
            vin: vin.to_string(),
            model: model.to_string(),
            color: "White".into(),
            category: "Sedan".into(),
            client_name: None,
            notes: None,
            expected_at: None,
            received_at: None,
            received_car_id: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        order
    }

    /// Emit a raw notification, as if another client had written a row.
    pub fn emit(&self, notification: ChangeNotification) {
        let _ = self.changes.send(notification);
    }

    /// Number of `list_cars` calls made for `floor`.
    pub fn list_calls(&self, floor: Floor) -> usize {
        self.list_calls
            .lock()
            .map(|calls| calls.get(&floor).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of write calls (create, move, receive) received.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Delay every `list_cars` call for `floor` by `delay`.
    pub fn set_read_delay(&self, floor: Floor, delay: Duration) {
        if let Ok(mut delays) = self.read_delays.lock() {
            delays.insert(floor, delay);
        }
    }

    /// Make every call fail with [`InventoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current copy of a stored car.
    pub fn car(&self, id: DbId) -> Option<Car> {
        self.lock_state().cars.get(&id).cloned()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not wedge every other assertion.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), InventoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable("in-memory backend offline".into()));
        }
        Ok(())
    }
}

fn new_car(state: &mut State, vin: &str, model: &str, floor: Floor) -> Car {
    state.next_car_id += 1;
    let now = Utc::now();
    Car {
        id: state.next_car_id,
        vin: vin.to_string(),
        model: model.to_string(),
        color: "White".into(),
        category: "Sedan".into(),
        status: "available".into(),
        current_floor: floor,
        client_name: None,
        customs: false,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

fn duplicate_vin(vin: &str) -> InventoryError {
    CoreError::Conflict(format!("A car with VIN {vin} already exists")).into()
}

#[async_trait]
impl InventoryBackend for InMemoryInventory {
    async fn health_check(&self) -> Result<(), InventoryError> {
        self.check_available()
    }

    async fn list_cars(&self, floor: Floor) -> Result<Vec<Car>, InventoryError> {
        if let Ok(mut calls) = self.list_calls.lock() {
            *calls.entry(floor).or_default() += 1;
        }

        let delay = self
            .read_delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(&floor).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_available()?;

        let mut cars: Vec<Car> = self
            .lock_state()
            .cars
            .values()
            .filter(|car| car.current_floor == floor)
            .cloned()
            .collect();
        cars.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(cars)
    }

    async fn find_car(&self, id: DbId) -> Result<Option<Car>, InventoryError> {
        self.check_available()?;
        Ok(self.car(id))
    }

    async fn create_car(&self, input: &CreateCar) -> Result<Car, InventoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let car = {
            let mut state = self.lock_state();
            if state.cars.values().any(|c| c.vin == input.vin) {
                return Err(duplicate_vin(&input.vin));
            }
            let mut car = new_car(&mut state, &input.vin, &input.model, input.current_floor);
            car.color = input.color.clone();
            car.category = input.category.clone();
            car.status = input.status.clone().unwrap_or_else(|| "available".into());
            car.client_name = input.client_name.clone();
            car.customs = input.customs;
            car.notes = input.notes.clone();
            state.cars.insert(car.id, car.clone());
            car
        };

        self.emit(ChangeNotification {
            event_type: ChangeKind::Insert,
            record: Some(CarRef::from(&car)),
            old_record: None,
        });
        Ok(car)
    }

    async fn move_car(&self, id: DbId, destination: Floor) -> Result<Car, InventoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let (old, moved) = {
            let mut state = self.lock_state();
            let car = state
                .cars
                .get_mut(&id)
                .ok_or(CoreError::NotFound { entity: "Car", id })?;
            if car.current_floor == destination {
                return Err(CoreError::Conflict(format!(
                    "Car {} is already on {}",
                    car.vin,
                    destination.label()
                ))
                .into());
            }
            let old = car.clone();
            car.current_floor = destination;
            car.updated_at = Utc::now();
            (old, car.clone())
        };

        self.emit(ChangeNotification {
            event_type: ChangeKind::Update,
            record: Some(CarRef::from(&moved)),
            old_record: Some(CarRef::from(&old)),
        });
        Ok(moved)
    }

    async fn list_pending_orders(&self) -> Result<Vec<OrderedCar>, InventoryError> {
        self.check_available()?;
        Ok(self
            .lock_state()
            .orders
            .values()
            .filter(|order| !order.is_received())
            .cloned()
            .collect())
    }

    async fn create_ordered_car(
        &self,
        input: &CreateOrderedCar,
    ) -> Result<OrderedCar, InventoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut state = self.lock_state();
        if state.orders.values().any(|o| o.vin == input.vin) {
            return Err(CoreError::Conflict(format!(
                "An order with VIN {} already exists",
                input.vin
            ))
            .into());
        }
        state.next_order_id += 1;
        let now = Utc::now();
        let order = OrderedCar {
            id: state.next_order_id,
            vin: input.vin.clone(),
            model: input.model.clone(),
            color: input.color.clone(),
            category: input.category.clone(),
            client_name: input.client_name.clone(),
            notes: input.notes.clone(),
            expected_at: input.expected_at,
            received_at: None,
            received_car_id: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn receive_ordered_car(
        &self,
        ordered_car_id: DbId,
        destination: Floor,
    ) -> Result<Car, InventoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        validate_receive_destination(destination)?;

        let car = {
            let mut state = self.lock_state();
            let order = state
                .orders
                .get(&ordered_car_id)
                .cloned()
                .ok_or(CoreError::NotFound {
                    entity: "OrderedCar",
                    id: ordered_car_id,
                })?;
            if order.is_received() {
                return Err(CoreError::Conflict(format!(
                    "Ordered car {} has already been received",
                    order.vin
                ))
                .into());
            }
            if state.cars.values().any(|c| c.vin == order.vin) {
                return Err(duplicate_vin(&order.vin));
            }

            let mut car = new_car(&mut state, &order.vin, &order.model, destination);
            car.color = order.color.clone();
            car.category = order.category.clone();
            car.client_name = order.client_name.clone();
            car.notes = order.notes.clone();
            state.cars.insert(car.id, car.clone());

            if let Some(stored) = state.orders.get_mut(&ordered_car_id) {
                stored.received_at = Some(car.created_at);
                stored.received_car_id = Some(car.id);
                stored.updated_at = car.created_at;
            }
            car
        };

        self.emit(ChangeNotification {
            event_type: ChangeKind::Insert,
            record: Some(CarRef::from(&car)),
            old_record: None,
        });
        Ok(car)
    }
}

#[async_trait]
impl ChangeFeed for InMemoryInventory {
    async fn subscribe(&self) -> Result<ChangeStream, FeedError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FeedError::Connection(sqlx::Error::PoolTimedOut));
        }

        let rx = self.changes.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => return Some((Ok(notification), rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }
}
