//! Handlers for the floor registry and the live per-floor car lists.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::de::value::StringDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

use dealer_core::floors::Floor;
use dealer_core::ordering::SortDirection;
use dealer_db::models::car::Car;
use dealer_inventory::filter::{filter_cars, CarFilter};
use dealer_inventory::sort::{sort_cars, SortKey, SortSpec};
use dealer_inventory::InventoryError;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// One entry of the floor registry.
#[derive(Debug, Serialize)]
pub struct FloorInfo {
    pub floor: Floor,
    pub label: &'static str,
    pub accepts_arrivals: bool,
}

/// Query parameters for a floor's car list.
///
/// Blank values (`?customs=`) place no constraint. `direction` only applies
/// when `sort` is given.
#[derive(Debug, Default, Deserialize)]
pub struct CarListParams {
    pub model: Option<String>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank_bool")]
    pub customs: Option<bool>,
    pub notes: Option<String>,
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort: Option<SortKey>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub direction: Option<SortDirection>,
    /// Force a fresh fetch before answering.
    #[serde(default, deserialize_with = "blank_bool")]
    pub refresh: Option<bool>,
}

/// Non-blank query value, trimmed.
fn non_blank_param<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty()))
}

/// Enum query value by its serde name; blank means absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match non_blank_param(deserializer)? {
        Some(raw) => {
            let value: StringDeserializer<D::Error> = raw.into_deserializer();
            T::deserialize(value).map(Some)
        }
        None => Ok(None),
    }
}

/// `true`/`false` query value; blank means absent.
fn blank_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    non_blank_param(deserializer)?
        .map(|raw| raw.parse::<bool>().map_err(de::Error::custom))
        .transpose()
}

impl CarListParams {
    fn filter(&self) -> CarFilter {
        CarFilter {
            model: self.model.clone(),
            vin: self.vin.clone(),
            color: self.color.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
            location: None,
            customs: self.customs,
            notes: self.notes.clone(),
            client_name: self.client_name.clone(),
        }
    }

    fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
            .map(|key| SortSpec::new(key, self.direction.unwrap_or_default()))
    }
}

/// A floor's car list as served to clients.
#[derive(Debug, Serialize)]
pub struct FloorCars {
    pub floor: Floor,
    /// Generation of the fetch the list came from.
    pub generation: u64,
    /// Whether a newer fetch was in flight when the list was served.
    pub refreshing: bool,
    /// Cars on the floor before filtering.
    pub total: usize,
    pub cars: Vec<Car>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /floors
pub async fn list_floors() -> impl IntoResponse {
    let floors: Vec<FloorInfo> = Floor::ALL
        .into_iter()
        .map(|floor| FloorInfo {
            floor,
            label: floor.label(),
            accepts_arrivals: floor.accepts_arrivals(),
        })
        .collect();

    Json(DataResponse { data: floors })
}

/// GET /floors/{floor}/cars
///
/// Served from the floor's live view. The list is filtered, then sorted.
pub async fn list_floor_cars(
    State(state): State<AppState>,
    Path(floor): Path<String>,
    params: Result<Query<CarListParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let floor: Floor = floor.parse()?;
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let view = state.board.view(floor);

    let snapshot = if params.refresh.unwrap_or(false) {
        view.refresh().await?
    } else {
        view.settled().await?
    };

    // The last landed fetch failed; a retry may already be in flight.
    if let Some(message) = snapshot.error {
        return Err(AppError::from(InventoryError::Unavailable(message)));
    }

    let total = snapshot.cars.len();
    let mut cars = filter_cars(&snapshot.cars, &params.filter());
    if let Some(spec) = params.sort_spec() {
        sort_cars(&mut cars, spec);
    }

    Ok(Json(DataResponse {
        data: FloorCars {
            floor,
            generation: snapshot.loaded_generation,
            refreshing: snapshot.loaded_generation < snapshot.generation,
            total,
            cars,
        },
    }))
}
