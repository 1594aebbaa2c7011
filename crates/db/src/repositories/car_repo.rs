//! Repository for the `cars` table.

use dealer_core::floors::Floor;
use dealer_core::types::DbId;
use sqlx::PgPool;

use crate::models::car::{Car, CreateCar};

/// Column list for cars queries.
const COLUMNS: &str = "id, vin, model, color, category, status, current_floor, \
    client_name, customs, notes, created_at, updated_at";

/// Default status for directly entered cars.
const DEFAULT_STATUS: &str = "available";

/// Provides read and move operations for cars.
pub struct CarRepo;

impl CarRepo {
    /// Insert a car entered directly onto a floor, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCar) -> Result<Car, sqlx::Error> {
        let status = input.status.as_deref().unwrap_or(DEFAULT_STATUS);
        let query = format!(
            "INSERT INTO cars
                (vin, model, color, category, status, current_floor, client_name, customs, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(&input.vin)
            .bind(&input.model)
            .bind(&input.color)
            .bind(&input.category)
            .bind(status)
            .bind(input.current_floor.as_str())
            .bind(&input.client_name)
            .bind(input.customs)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Find a car by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Car>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cars WHERE id = $1");
        sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all cars currently on a floor, most recently touched first.
    pub async fn list_by_floor(pool: &PgPool, floor: Floor) -> Result<Vec<Car>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cars
             WHERE current_floor = $1
             ORDER BY updated_at DESC, id ASC"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(floor.as_str())
            .fetch_all(pool)
            .await
    }

    /// Move a car to `destination` in a single statement.
    ///
    /// Returns `None` when no row matched: either the car does not exist or
    /// it is already on `destination`. The guard on `current_floor` makes a
    /// duplicate submission of the same move a no-op rather than a second
    /// write.
    pub async fn move_to_floor(
        pool: &PgPool,
        id: DbId,
        destination: Floor,
    ) -> Result<Option<Car>, sqlx::Error> {
        let query = format!(
            "UPDATE cars SET current_floor = $2
             WHERE id = $1 AND current_floor <> $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .bind(destination.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Receive an ordered car onto `destination` via the
    /// `receive_ordered_car` database function.
    ///
    /// The function raises `P0002` for an unknown order, `55000` for an
    /// order already received and `23514` for a destination outside the
    /// arrival whitelist.
    pub async fn receive_ordered(
        pool: &PgPool,
        ordered_car_id: DbId,
        destination: Floor,
    ) -> Result<Car, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM receive_ordered_car($1, $2)");
        sqlx::query_as::<_, Car>(&query)
            .bind(ordered_car_id)
            .bind(destination.as_str())
            .fetch_one(pool)
            .await
    }
}
