//! Car entity model and DTOs.

use dealer_core::floors::Floor;
use dealer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cars` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Car {
    pub id: DbId,
    pub vin: String,
    pub model: String,
    pub color: String,
    pub category: String,
    pub status: String,
    #[sqlx(try_from = "String")]
    pub current_floor: Floor,
    pub client_name: Option<String>,
    pub customs: bool,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for entering a car directly onto a floor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCar {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub category: String,
    /// Defaults to `available` if omitted.
    pub status: Option<String>,
    pub current_floor: Floor,
    pub client_name: Option<String>,
    #[serde(default)]
    pub customs: bool,
    pub notes: Option<String>,
}

/// Request body for moving a car to another floor.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveCar {
    pub destination_floor: Floor,
}
