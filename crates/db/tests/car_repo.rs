//! Integration tests for the car and ordered-car repositories.
//!
//! Exercises the repository layer against a real database:
//! - Direct entry and floor listing
//! - Single-statement moves and the same-floor guard
//! - Receiving ordered cars through the database function
//! - Constraint enforcement on floors and VINs
//! - Change notifications staying small for rows with long notes

use dealer_core::floors::Floor;
use dealer_core::validation::MAX_NOTES_LENGTH;
use dealer_db::models::car::CreateCar;
use dealer_db::models::ordered_car::CreateOrderedCar;
use dealer_db::repositories::{CarRepo, OrderedCarRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_car(vin: &str, floor: Floor) -> CreateCar {
    CreateCar {
        vin: vin.to_string(),
        model: "Model X".to_string(),
        color: "Black".to_string(),
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
        model: "Model Y".to_string(),
        color: "White".to_string(),
        category: "Crossover".to_string(),
        client_name: Some("Dana Smith".to_string()),
        notes: Some("Tow hitch".to_string()),
        expected_at: None,
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Cars
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_defaults_status_to_available(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("VIN001", Floor::CarInventory))
        .await
        .unwrap();

    assert_eq!(car.status, "available");
    assert_eq!(car.current_floor, Floor::CarInventory);
    assert!(!car.customs);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_by_floor_only_returns_that_floor(pool: PgPool) {
    CarRepo::create(&pool, &new_car("VIN001", Floor::Showroom1)).await.unwrap();
    CarRepo::create(&pool, &new_car("VIN002", Floor::Showroom1)).await.unwrap();
    CarRepo::create(&pool, &new_car("VIN003", Floor::GarageInventory)).await.unwrap();

    let showroom = CarRepo::list_by_floor(&pool, Floor::Showroom1).await.unwrap();
    assert_eq!(showroom.len(), 2);
    assert!(showroom.iter().all(|c| c.current_floor == Floor::Showroom1));

    let schedule = CarRepo::list_by_floor(&pool, Floor::Schedule).await.unwrap();
    assert!(schedule.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn move_updates_floor_and_lists(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("VIN123", Floor::CarInventory))
        .await
        .unwrap();

    let moved = CarRepo::move_to_floor(&pool, car.id, Floor::Schedule)
        .await
        .unwrap()
        .expect("car should move");
    assert_eq!(moved.id, car.id);
    assert_eq!(moved.current_floor, Floor::Schedule);

    let schedule = CarRepo::list_by_floor(&pool, Floor::Schedule).await.unwrap();
    assert_eq!(schedule.iter().filter(|c| c.vin == "VIN123").count(), 1);

    let inventory = CarRepo::list_by_floor(&pool, Floor::CarInventory).await.unwrap();
    assert!(inventory.iter().all(|c| c.vin != "VIN123"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn move_to_current_floor_matches_nothing(pool: PgPool) {
    let car = CarRepo::create(&pool, &new_car("VIN001", Floor::Showroom2))
        .await
        .unwrap();

    let result = CarRepo::move_to_floor(&pool, car.id, Floor::Showroom2).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn move_unknown_car_matches_nothing(pool: PgPool) {
    let result = CarRepo::move_to_floor(&pool, 999_999, Floor::Schedule).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_vin_violates_unique_constraint(pool: PgPool) {
    CarRepo::create(&pool, &new_car("VIN001", Floor::Showroom1)).await.unwrap();
    let err = CarRepo::create(&pool, &new_car("VIN001", Floor::Showroom2))
        .await
        .unwrap_err();

    assert_eq!(sqlstate(&err).as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_floor_violates_check_constraint(pool: PgPool) {
    let err = sqlx::query(
        "INSERT INTO cars (vin, model, color, category, current_floor)
         VALUES ('VIN009', 'Model 3', 'Red', 'Sedan', 'BASEMENT')",
    )
    .execute(&pool)
    .await
    .unwrap_err();

    assert_eq!(sqlstate(&err).as_deref(), Some("23514"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn car_with_longest_notes_can_be_created_and_moved(pool: PgPool) {
    // Two bytes per character: well past the 8000-byte notify limit.
    let notes = "é".repeat(MAX_NOTES_LENGTH);
    let mut input = new_car("VIN777", Floor::CarInventory);
    input.notes = Some(notes.clone());

    let car = CarRepo::create(&pool, &input).await.unwrap();
    let moved = CarRepo::move_to_floor(&pool, car.id, Floor::Schedule)
        .await
        .unwrap()
        .expect("car should move");

    assert_eq!(moved.current_floor, Floor::Schedule);
    assert_eq!(moved.notes.as_deref(), Some(notes.as_str()));
}

// ---------------------------------------------------------------------------
// Ordered cars
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_with_longest_notes_can_be_received(pool: PgPool) {
    let mut input = new_order("ORD777");
    input.notes = Some("x".repeat(MAX_NOTES_LENGTH));
    let order = OrderedCarRepo::create(&pool, &input).await.unwrap();

    let car = CarRepo::receive_ordered(&pool, order.id, Floor::Showroom1)
        .await
        .unwrap();
    assert_eq!(car.notes.map(|n| n.len()), Some(MAX_NOTES_LENGTH));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receive_creates_car_and_marks_order(pool: PgPool) {
    let order = OrderedCarRepo::create(&pool, &new_order("ORD001")).await.unwrap();
    assert!(!order.is_received());

    let car = CarRepo::receive_ordered(&pool, order.id, Floor::GarageInventory)
        .await
        .unwrap();
    assert_eq!(car.vin, "ORD001");
    assert_eq!(car.current_floor, Floor::GarageInventory);
    assert_eq!(car.client_name.as_deref(), Some("Dana Smith"));

    let order = OrderedCarRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert!(order.is_received());
    assert_eq!(order.received_car_id, Some(car.id));

    let pending = OrderedCarRepo::list_pending(&pool).await.unwrap();
    assert!(pending.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_twice_is_rejected(pool: PgPool) {
    let order = OrderedCarRepo::create(&pool, &new_order("ORD001")).await.unwrap();
    CarRepo::receive_ordered(&pool, order.id, Floor::CarInventory).await.unwrap();

    let err = CarRepo::receive_ordered(&pool, order.id, Floor::Showroom1)
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err).as_deref(), Some("55000"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_onto_schedule_is_rejected(pool: PgPool) {
    let order = OrderedCarRepo::create(&pool, &new_order("ORD001")).await.unwrap();

    let err = CarRepo::receive_ordered(&pool, order.id, Floor::Schedule)
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err).as_deref(), Some("23514"));

    let order = OrderedCarRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert!(!order.is_received());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_unknown_order_is_not_found(pool: PgPool) {
    let err = CarRepo::receive_ordered(&pool, 424_242, Floor::CarInventory)
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err).as_deref(), Some("P0002"));
}
