//! Route definitions for the floor registry and per-floor car lists.
//!
//! Mounted at `/floors` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::floors;
use crate::state::AppState;

/// ```text
/// GET /                  -> list_floors
/// GET /{floor}/cars      -> list_floor_cars (?model, vin, color, category,
///                           status, customs, notes, client_name, sort,
///                           direction, refresh)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(floors::list_floors))
        .route("/{floor}/cars", get(floors::list_floor_cars))
}
