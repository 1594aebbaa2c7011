//! Repository for the `ordered_cars` table.

use dealer_core::types::DbId;
use sqlx::PgPool;

use crate::models::ordered_car::{CreateOrderedCar, OrderedCar};

/// Column list for ordered_cars queries.
const COLUMNS: &str = "id, vin, model, color, category, client_name, notes, \
    expected_at, received_at, received_car_id, created_at, updated_at";

/// Provides CRUD operations for ordered cars.
pub struct OrderedCarRepo;

impl OrderedCarRepo {
    /// Record a new pending arrival, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateOrderedCar,
    ) -> Result<OrderedCar, sqlx::Error> {
        let query = format!(
            "INSERT INTO ordered_cars
                (vin, model, color, category, client_name, notes, expected_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderedCar>(&query)
            .bind(&input.vin)
            .bind(&input.model)
            .bind(&input.color)
            .bind(&input.category)
            .bind(&input.client_name)
            .bind(&input.notes)
            .bind(input.expected_at)
            .fetch_one(pool)
            .await
    }

    /// Find an ordered car by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OrderedCar>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ordered_cars WHERE id = $1");
        sqlx::query_as::<_, OrderedCar>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List orders not yet received, soonest expected first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<OrderedCar>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ordered_cars
             WHERE received_at IS NULL
             ORDER BY expected_at ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, OrderedCar>(&query)
            .fetch_all(pool)
            .await
    }
}
