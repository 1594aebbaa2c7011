//! Integration tests for the PostgreSQL backend and the live change feed.
//!
//! Runs against a real database:
//! - Writes through `PgInventory` reach a `RealtimeFanout` over
//!   `PgChangeFeed` as typed events
//! - Database errors map onto domain errors

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use dealer_core::error::CoreError;
use dealer_core::floors::Floor;
use dealer_core::validation::MAX_NOTES_LENGTH;
use dealer_db::models::car::CreateCar;
use dealer_db::models::ordered_car::CreateOrderedCar;
use dealer_events::{
    CarChangeEvent, ChangeKind, EventBus, EventSink, FeedStatus, PgChangeFeed, RealtimeFanout,
    ReconnectConfig,
};
use dealer_inventory::{InventoryBackend, InventoryError, PgInventory};
use sqlx::PgPool;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_car(vin: &str, floor: Floor) -> CreateCar {
    CreateCar {
        vin: vin.to_string(),
        model: "Model X".to_string(),
        color: "Red".to_string(),
        category: "SUV".to_string(),
        status: None,
        current_floor: floor,
        client_name: None,
        customs: false,
        notes: None,
    }
}

fn new_order(vin: &str) -> CreateOrderedCar {
    CreateOrderedCar {
        vin: vin.to_string(),
        model: "Model 3".to_string(),
        color: "Grey".to_string(),
        category: "Sedan".to_string(),
        client_name: None,
        notes: None,
        expected_at: None,
    }
}

async fn next_event(rx: &mut broadcast::Receiver<CarChangeEvent>) -> CarChangeEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("change event within 5s")
        .expect("bus open")
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn writes_reach_the_fanout_as_events(pool: PgPool) {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let mut fanout = RealtimeFanout::new(
        Arc::new(PgChangeFeed::new(pool.clone())),
        Arc::clone(&bus) as Arc<dyn EventSink>,
        ReconnectConfig::default(),
    );
    fanout.start().unwrap();
    fanout
        .status()
        .wait_for(|s| *s == FeedStatus::Connected)
        .await
        .unwrap();

    let backend = PgInventory::new(pool);
    let mut input = new_car("VIN123", Floor::CarInventory);
    input.notes = Some("é".repeat(MAX_NOTES_LENGTH));
    let car = backend.create_car(&input).await.unwrap();

    let inserted = next_event(&mut rx).await;
    assert_eq!(inserted.change_kind, ChangeKind::Insert);
    assert_eq!(inserted.record.id, car.id);
    assert_eq!(inserted.affected_floor, Floor::CarInventory);
    assert_eq!(inserted.previous_floor, None);

    backend.move_car(car.id, Floor::Schedule).await.unwrap();

    let moved = next_event(&mut rx).await;
    assert_eq!(moved.change_kind, ChangeKind::Update);
    assert_eq!(moved.record.vin, "VIN123");
    assert_eq!(moved.affected_floor, Floor::Schedule);
    assert_eq!(moved.previous_floor, Some(Floor::CarInventory));
    assert!(moved.concerns(Floor::CarInventory));

    fanout.stop().await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_an_order_publishes_an_insert(pool: PgPool) {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let mut fanout = RealtimeFanout::new(
        Arc::new(PgChangeFeed::new(pool.clone())),
        Arc::clone(&bus) as Arc<dyn EventSink>,
        ReconnectConfig::default(),
    );
    fanout.start().unwrap();
    fanout
        .status()
        .wait_for(|s| *s == FeedStatus::Connected)
        .await
        .unwrap();

    let backend = PgInventory::new(pool);
    let order = backend.create_ordered_car(&new_order("ORD001")).await.unwrap();
    let car = backend
        .receive_ordered_car(order.id, Floor::GarageInventory)
        .await
        .unwrap();

    let event = next_event(&mut rx).await;
    assert_eq!(event.change_kind, ChangeKind::Insert);
    assert_eq!(event.record.id, car.id);
    assert_eq!(event.affected_floor, Floor::GarageInventory);

    fanout.stop().await;
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_vin_is_a_conflict(pool: PgPool) {
    let backend = PgInventory::new(pool);
    backend.create_car(&new_car("VIN001", Floor::Showroom1)).await.unwrap();

    let result = backend.create_car(&new_car("VIN001", Floor::Showroom2)).await;
    assert_matches!(result, Err(InventoryError::Core(CoreError::Conflict(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_twice_is_a_conflict(pool: PgPool) {
    let backend = PgInventory::new(pool);
    let order = backend.create_ordered_car(&new_order("ORD001")).await.unwrap();
    backend
        .receive_ordered_car(order.id, Floor::CarInventory)
        .await
        .unwrap();

    let result = backend.receive_ordered_car(order.id, Floor::Showroom1).await;
    assert_matches!(result, Err(InventoryError::Core(CoreError::Conflict(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_unknown_order_is_not_found(pool: PgPool) {
    let backend = PgInventory::new(pool);

    let result = backend.receive_ordered_car(424_242, Floor::CarInventory).await;
    assert_matches!(
        result,
        Err(InventoryError::Core(CoreError::NotFound { entity: "OrderedCar", id: 424_242 }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_onto_schedule_is_a_validation_error(pool: PgPool) {
    let backend = PgInventory::new(pool);
    let order = backend.create_ordered_car(&new_order("ORD001")).await.unwrap();

    let result = backend.receive_ordered_car(order.id, Floor::Schedule).await;
    assert_matches!(result, Err(InventoryError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn moves_distinguish_missing_car_from_same_floor(pool: PgPool) {
    let backend = PgInventory::new(pool);
    let car = backend.create_car(&new_car("VIN002", Floor::Showroom2)).await.unwrap();

    let same_floor = backend.move_car(car.id, Floor::Showroom2).await;
    assert_matches!(same_floor, Err(InventoryError::Core(CoreError::Conflict(_))));

    let missing = backend.move_car(999_999, Floor::Schedule).await;
    assert_matches!(
        missing,
        Err(InventoryError::Core(CoreError::NotFound { entity: "Car", .. }))
    );
}
