//! Floor / location registry.
//!
//! A [`Floor`] is the physical or logical location a car currently occupies.
//! The set is closed: the database enforces it with a CHECK constraint on
//! `cars.current_floor`, and every wire format uses the upper-snake names
//! returned by [`Floor::as_str`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Every inventory location a car can be on.
///
/// Variant order is the registry order used for listing and for sorting by
/// location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Floor {
    #[serde(rename = "SHOWROOM_1")]
    Showroom1,
    #[serde(rename = "SHOWROOM_2")]
    Showroom2,
    #[serde(rename = "CAR_INVENTORY")]
    CarInventory,
    #[serde(rename = "GARAGE_INVENTORY")]
    GarageInventory,
    #[serde(rename = "SCHEDULE")]
    Schedule,
}

/// Floors an ordered car may be received onto.
///
/// Arrivals go to stock or straight onto a showroom; they are never booked
/// directly into the delivery schedule.
pub const RECEIVE_DESTINATIONS: &[Floor] = &[
    Floor::CarInventory,
    Floor::GarageInventory,
    Floor::Showroom1,
    Floor::Showroom2,
];

impl Floor {
    /// All floors in registry order.
    pub const ALL: [Floor; 5] = [
        Floor::Showroom1,
        Floor::Showroom2,
        Floor::CarInventory,
        Floor::GarageInventory,
        Floor::Schedule,
    ];

    /// Stable identifier stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Floor::Showroom1 => "SHOWROOM_1",
            Floor::Showroom2 => "SHOWROOM_2",
            Floor::CarInventory => "CAR_INVENTORY",
            Floor::GarageInventory => "GARAGE_INVENTORY",
            Floor::Schedule => "SCHEDULE",
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Floor::Showroom1 => "Showroom 1",
            Floor::Showroom2 => "Showroom 2",
            Floor::CarInventory => "Car Inventory",
            Floor::GarageInventory => "Garage Inventory",
            Floor::Schedule => "Schedule",
        }
    }

    /// Whether an ordered car may be received onto this floor.
    pub fn accepts_arrivals(self) -> bool {
        RECEIVE_DESTINATIONS.contains(&self)
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Floor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Floor::ALL
            .into_iter()
            .find(|floor| floor.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown floor '{s}'")))
    }
}

impl TryFrom<String> for Floor {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Validate a move of an existing car from `from` to `to`.
///
/// A move must change the floor; moving a car onto the floor it already
/// occupies is rejected before any backend call is made.
pub fn validate_move_destination(from: Floor, to: Floor) -> Result<(), CoreError> {
    if from == to {
        return Err(CoreError::Validation(format!(
            "Car is already on {}",
            to.label()
        )));
    }
    Ok(())
}

/// Validate the destination floor for receiving an ordered car.
pub fn validate_receive_destination(to: Floor) -> Result<(), CoreError> {
    if !to.accepts_arrivals() {
        let allowed: Vec<&str> = RECEIVE_DESTINATIONS.iter().map(|f| f.as_str()).collect();
        return Err(CoreError::Validation(format!(
            "Ordered cars cannot be received onto {to}; allowed: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
