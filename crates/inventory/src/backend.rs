//! Read/write contract with the inventory backend.
//!
//! The workflow layer never reconstructs a car locally after a write: every
//! write returns the backend's authoritative row.

use async_trait::async_trait;
use dealer_core::error::CoreError;
use dealer_core::floors::Floor;
use dealer_core::types::DbId;
use dealer_db::models::car::{Car, CreateCar};
use dealer_db::models::ordered_car::{CreateOrderedCar, OrderedCar};
use dealer_db::repositories::{CarRepo, OrderedCarRepo};
use dealer_db::DbPool;

use crate::error::InventoryError;

/// The backend operations the workflow layer depends on.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Confirm the backend is reachable.
    async fn health_check(&self) -> Result<(), InventoryError>;

    /// Read path: every car currently on `floor`.
    async fn list_cars(&self, floor: Floor) -> Result<Vec<Car>, InventoryError>;

    /// Fetch one car by id.
    async fn find_car(&self, id: DbId) -> Result<Option<Car>, InventoryError>;

    /// Enter a car directly onto a floor.
    async fn create_car(&self, input: &CreateCar) -> Result<Car, InventoryError>;

    /// Write path: move a car in one atomic call.
    async fn move_car(&self, id: DbId, destination: Floor) -> Result<Car, InventoryError>;

    /// Orders not yet received.
    async fn list_pending_orders(&self) -> Result<Vec<OrderedCar>, InventoryError>;

    /// Record a pending arrival.
    async fn create_ordered_car(
        &self,
        input: &CreateOrderedCar,
    ) -> Result<OrderedCar, InventoryError>;

    /// Write path: convert an ordered car into a car on `destination` in one
    /// atomic call.
    async fn receive_ordered_car(
        &self,
        ordered_car_id: DbId,
        destination: Floor,
    ) -> Result<Car, InventoryError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`InventoryBackend`] backed by the `cars` / `ordered_cars` tables.
#[derive(Clone)]
pub struct PgInventory {
    pool: DbPool,
}

impl PgInventory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryBackend for PgInventory {
    async fn health_check(&self) -> Result<(), InventoryError> {
        Ok(dealer_db::health_check(&self.pool).await?)
    }

    async fn list_cars(&self, floor: Floor) -> Result<Vec<Car>, InventoryError> {
        Ok(CarRepo::list_by_floor(&self.pool, floor).await?)
    }

    async fn find_car(&self, id: DbId) -> Result<Option<Car>, InventoryError> {
        Ok(CarRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_car(&self, input: &CreateCar) -> Result<Car, InventoryError> {
        CarRepo::create(&self.pool, input)
            .await
            .map_err(|e| classify_db_error(e, "Car", 0))
    }

    async fn move_car(&self, id: DbId, destination: Floor) -> Result<Car, InventoryError> {
        if let Some(car) = CarRepo::move_to_floor(&self.pool, id, destination).await? {
            return Ok(car);
        }

        // Nothing matched: tell "unknown car" apart from "already there".
        match CarRepo::find_by_id(&self.pool, id).await? {
            None => Err(CoreError::NotFound { entity: "Car", id }.into()),
            Some(car) => Err(CoreError::Conflict(format!(
                "Car {} is already on {}",
                car.vin,
                car.current_floor.label()
            ))
            .into()),
        }
    }

    async fn list_pending_orders(&self) -> Result<Vec<OrderedCar>, InventoryError> {
        Ok(OrderedCarRepo::list_pending(&self.pool).await?)
    }

    async fn create_ordered_car(
        &self,
        input: &CreateOrderedCar,
    ) -> Result<OrderedCar, InventoryError> {
        OrderedCarRepo::create(&self.pool, input)
            .await
            .map_err(|e| classify_db_error(e, "OrderedCar", 0))
    }

    async fn receive_ordered_car(
        &self,
        ordered_car_id: DbId,
        destination: Floor,
    ) -> Result<Car, InventoryError> {
        CarRepo::receive_ordered(&self.pool, ordered_car_id, destination)
            .await
            .map_err(|e| classify_db_error(e, "OrderedCar", ordered_car_id))
    }
}

/// Map SQLSTATEs raised by constraints and the database functions onto
/// domain errors.
///
/// - `P0002` (no_data_found) -> not found
/// - `55000` (object_not_in_prerequisite_state) -> conflict
/// - `23505` on a `uq_` constraint -> conflict
/// - `23514` (check_violation) -> validation
fn classify_db_error(err: sqlx::Error, entity: &'static str, id: DbId) -> InventoryError {
    let sqlx::Error::Database(db_err) = &err else {
        return InventoryError::Database(err);
    };

    match db_err.code().as_deref() {
        Some("P0002") => CoreError::NotFound { entity, id }.into(),
        Some("55000") => CoreError::Conflict(db_err.message().to_string()).into(),
        Some("23505") if db_err.constraint().is_some_and(|c| c.starts_with("uq_")) => {
            CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {}",
                db_err.constraint().unwrap_or("unknown")
            ))
            .into()
        }
        Some("23514") => CoreError::Validation(db_err.message().to_string()).into(),
        _ => InventoryError::Database(err),
    }
}
