//! Narrowing a car list by attribute.
//!
//! All criteria are conjunctive and optional. An absent or blank value
//! places no constraint, so `{model: "Model X", color: ""}` filters on model
//! alone.

use dealer_core::floors::Floor;
use dealer_core::ordering::{contains_ignore_case, non_blank};
use dealer_db::models::car::Car;
use serde::Deserialize;

/// Filter criteria for a car list.
///
/// `model`, `category` and `status` match exactly (case-sensitive);
/// `vin`, `color`, `notes` and `client_name` match as case-insensitive
/// substrings; `location` and `customs` match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CarFilter {
    pub model: Option<String>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub location: Option<Floor>,
    pub customs: Option<bool>,
    pub notes: Option<String>,
    pub client_name: Option<String>,
}

impl CarFilter {
    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        non_blank(self.model.as_deref()).is_none()
            && non_blank(self.vin.as_deref()).is_none()
            && non_blank(self.color.as_deref()).is_none()
            && non_blank(self.category.as_deref()).is_none()
            && non_blank(self.status.as_deref()).is_none()
            && self.location.is_none()
            && self.customs.is_none()
            && non_blank(self.notes.as_deref()).is_none()
            && non_blank(self.client_name.as_deref()).is_none()
    }

    /// Whether `car` satisfies every set criterion.
    pub fn matches(&self, car: &Car) -> bool {
        exact(self.model.as_deref(), &car.model)
            && exact(self.category.as_deref(), &car.category)
            && exact(self.status.as_deref(), &car.status)
            && substring(self.vin.as_deref(), Some(&car.vin))
            && substring(self.color.as_deref(), Some(&car.color))
            && substring(self.notes.as_deref(), car.notes.as_deref())
            && substring(self.client_name.as_deref(), car.client_name.as_deref())
            && self.location.is_none_or(|floor| floor == car.current_floor)
            && self.customs.is_none_or(|customs| customs == car.customs)
    }
}

fn exact(wanted: Option<&str>, actual: &str) -> bool {
    non_blank(wanted).is_none_or(|w| w == actual)
}

fn substring(needle: Option<&str>, haystack: Option<&str>) -> bool {
    match non_blank(needle) {
        None => true,
        Some(needle) => haystack.is_some_and(|h| contains_ignore_case(h, needle)),
    }
}

/// Cars from `cars` that satisfy `filter`, in their original relative order.
pub fn filter_cars(cars: &[Car], filter: &CarFilter) -> Vec<Car> {
    cars.iter().filter(|car| filter.matches(car)).cloned().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
