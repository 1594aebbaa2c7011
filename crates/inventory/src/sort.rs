//! Ordering a car list by one attribute.

use std::cmp::Ordering;

use dealer_core::ordering::{cmp_ignore_case, compare_missing_last, non_blank, SortDirection};
use dealer_db::models::car::Car;
use serde::{Deserialize, Serialize};

/// Attribute a car list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Vin,
    Model,
    Color,
    Category,
    Status,
    Location,
    ClientName,
    Customs,
    Notes,
    CreatedAt,
    UpdatedAt,
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Same key, opposite direction.
    pub fn toggled(self) -> Self {
        Self {
            direction: self.direction.toggled(),
            ..self
        }
    }
}

fn text(value: &str) -> Option<&str> {
    non_blank(Some(value))
}

/// Compare two cars under `spec`.
///
/// Blank or absent values sort after every present value regardless of
/// direction. Text compares case-insensitively.
pub fn compare_cars(a: &Car, b: &Car, spec: SortSpec) -> Ordering {
    let dir = spec.direction;
    match spec.key {
        SortKey::Vin => compare_missing_last(text(&a.vin), text(&b.vin), dir, |x, y| {
            cmp_ignore_case(x, y)
        }),
        SortKey::Model => compare_missing_last(text(&a.model), text(&b.model), dir, |x, y| {
            cmp_ignore_case(x, y)
        }),
        SortKey::Color => compare_missing_last(text(&a.color), text(&b.color), dir, |x, y| {
            cmp_ignore_case(x, y)
        }),
        SortKey::Category => {
            compare_missing_last(text(&a.category), text(&b.category), dir, |x, y| {
                cmp_ignore_case(x, y)
            })
        }
        SortKey::Status => compare_missing_last(text(&a.status), text(&b.status), dir, |x, y| {
            cmp_ignore_case(x, y)
        }),
        SortKey::Location => compare_missing_last(
            Some(a.current_floor),
            Some(b.current_floor),
            dir,
            Ord::cmp,
        ),
        SortKey::ClientName => compare_missing_last(
            non_blank(a.client_name.as_deref()),
            non_blank(b.client_name.as_deref()),
            dir,
            |x, y| cmp_ignore_case(x, y),
        ),
        SortKey::Customs => compare_missing_last(Some(a.customs), Some(b.customs), dir, Ord::cmp),
        SortKey::Notes => compare_missing_last(
            non_blank(a.notes.as_deref()),
            non_blank(b.notes.as_deref()),
            dir,
            |x, y| cmp_ignore_case(x, y),
        ),
        SortKey::CreatedAt => {
            compare_missing_last(Some(a.created_at), Some(b.created_at), dir, Ord::cmp)
        }
        SortKey::UpdatedAt => {
            compare_missing_last(Some(a.updated_at), Some(b.updated_at), dir, Ord::cmp)
        }
    }
}

/// Stable sort of `cars` by `spec`. Ties keep their input order.
pub fn sort_cars(cars: &mut [Car], spec: SortSpec) {
    cars.sort_by(|a, b| compare_cars(a, b, spec));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
