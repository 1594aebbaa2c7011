//! Ordered (pending arrival) car model and DTOs.

use dealer_core::floors::Floor;
use dealer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `ordered_cars` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct OrderedCar {
    pub id: DbId,
    pub vin: String,
    pub model: String,
    pub color: String,
    pub category: String,
    pub client_name: Option<String>,
    pub notes: Option<String>,
    pub expected_at: Option<Timestamp>,
    pub received_at: Option<Timestamp>,
    pub received_car_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderedCar {
    /// Whether the order has already been converted into a car.
    pub fn is_received(&self) -> bool {
        self.received_at.is_some()
    }
}

/// DTO for recording a new pending arrival.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderedCar {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub category: String,
    pub client_name: Option<String>,
    pub notes: Option<String>,
    pub expected_at: Option<Timestamp>,
}

/// Request body for receiving an ordered car onto a floor.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveOrderedCar {
    pub destination_floor: Floor,
}
