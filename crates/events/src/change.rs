//! Change notifications and the typed events derived from them.
//!
//! The database trigger publishes one [`ChangeNotification`] per affected
//! `cars` row. The fan-out translates each into exactly one
//! [`CarChangeEvent`], which names the floor the change is relevant to so
//! that consumers can filter without inspecting the record.
//!
//! Notifications carry only a [`CarRef`], never the full row: `pg_notify`
//! payloads are capped at 8000 bytes and a car's notes alone may exceed
//! that. Consumers that need the row read it back.

use chrono::Utc;
use dealer_core::floors::Floor;
use dealer_core::types::{DbId, Timestamp};
use dealer_db::models::car::Car;
use serde::{Deserialize, Serialize};

use crate::feed::FeedError;

/// Kind of row change reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Identity and location of a changed car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRef {
    pub id: DbId,
    pub vin: String,
    pub current_floor: Floor,
}

impl From<&Car> for CarRef {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            vin: car.vin.clone(),
            current_floor: car.current_floor,
        }
    }
}

/// Raw payload published on the `car_changes` channel.
///
/// `record` is the new row (absent for deletes), `old_record` the previous
/// row (absent for inserts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub event_type: ChangeKind,
    pub record: Option<CarRef>,
    pub old_record: Option<CarRef>,
}

/// A car change as seen by local consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarChangeEvent {
    pub change_kind: ChangeKind,
    /// Floor the car is on after the change (before it, for deletes).
    pub affected_floor: Floor,
    /// Floor the car left, when an update moved it.
    pub previous_floor: Option<Floor>,
    /// The car after the change (the deleted car, for deletes).
    pub record: CarRef,
    /// When the fan-out received the notification (UTC).
    pub received_at: Timestamp,
}

impl CarChangeEvent {
    /// Translate a raw notification into an event.
    ///
    /// Fails with [`FeedError::Malformed`] when the row required for the
    /// change kind is missing.
    pub fn from_notification(notification: ChangeNotification) -> Result<Self, FeedError> {
        let ChangeNotification {
            event_type,
            record,
            old_record,
        } = notification;

        let (record, previous_floor) = match event_type {
            ChangeKind::Insert => (record, None),
            ChangeKind::Update => {
                let moved_from = match (&record, old_record) {
                    (Some(new), Some(old)) if new.current_floor != old.current_floor => {
                        Some(old.current_floor)
                    }
                    _ => None,
                };
                (record, moved_from)
            }
            ChangeKind::Delete => (old_record, None),
        };

        let record = record.ok_or_else(|| {
            FeedError::Malformed(format!("{event_type:?} notification without a row"))
        })?;

        Ok(Self {
            change_kind: event_type,
            affected_floor: record.current_floor,
            previous_floor,
            record,
            received_at: Utc::now(),
        })
    }

    /// Whether a consumer watching `floor` should react to this event.
    ///
    /// A move is relevant to both the floor the car arrived on and the floor
    /// it left.
    pub fn concerns(&self, floor: Floor) -> bool {
        self.affected_floor == floor || self.previous_floor == Some(floor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn car(id: i64, floor: Floor) -> CarRef {
        CarRef {
            id,
            vin: format!("VIN{id:03}"),
            current_floor: floor,
        }
    }

    #[test]
    fn parses_trigger_payload() {
        let payload = r#"{
            "event_type": "update",
            "record": {"id": 7, "vin": "VIN123", "current_floor": "SCHEDULE"},
            "old_record": {"id": 7, "vin": "VIN123", "current_floor": "CAR_INVENTORY"}
        }"#;

        let notification: ChangeNotification = serde_json::from_str(payload).unwrap();
        assert_eq!(notification.event_type, ChangeKind::Update);

        let event = CarChangeEvent::from_notification(notification).unwrap();
        assert_eq!(event.affected_floor, Floor::Schedule);
        assert_eq!(event.previous_floor, Some(Floor::CarInventory));
        assert_eq!(event.record.vin, "VIN123");
    }

    #[test]
    fn insert_concerns_only_new_floor() {
        let event = CarChangeEvent::from_notification(ChangeNotification {
            event_type: ChangeKind::Insert,
            record: Some(car(1, Floor::Showroom1)),
            old_record: None,
        })
        .unwrap();

        assert!(event.concerns(Floor::Showroom1));
        assert!(!event.concerns(Floor::Showroom2));
        assert_eq!(event.previous_floor, None);
    }

    #[test]
    fn update_without_move_has_no_previous_floor() {
        let event = CarChangeEvent::from_notification(ChangeNotification {
            event_type: ChangeKind::Update,
            record: Some(car(1, Floor::GarageInventory)),
            old_record: Some(car(1, Floor::GarageInventory)),
        })
        .unwrap();

        assert_eq!(event.previous_floor, None);
        assert!(event.concerns(Floor::GarageInventory));
    }

    #[test]
    fn move_concerns_both_floors() {
        let event = CarChangeEvent::from_notification(ChangeNotification {
            event_type: ChangeKind::Update,
            record: Some(car(1, Floor::Schedule)),
            old_record: Some(car(1, Floor::CarInventory)),
        })
        .unwrap();

        assert!(event.concerns(Floor::Schedule));
        assert!(event.concerns(Floor::CarInventory));
        assert!(!event.concerns(Floor::Showroom1));
    }

    #[test]
    fn delete_uses_old_record() {
        let event = CarChangeEvent::from_notification(ChangeNotification {
            event_type: ChangeKind::Delete,
            record: None,
            old_record: Some(car(3, Floor::Showroom2)),
        })
        .unwrap();

        assert_eq!(event.change_kind, ChangeKind::Delete);
        assert_eq!(event.affected_floor, Floor::Showroom2);
        assert_eq!(event.record.id, 3);
    }

    #[test]
    fn missing_row_is_malformed() {
        let result = CarChangeEvent::from_notification(ChangeNotification {
            event_type: ChangeKind::Insert,
            record: None,
            old_record: None,
        });

        assert!(matches!(result, Err(FeedError::Malformed(_))));
    }
}
