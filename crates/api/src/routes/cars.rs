//! Route definitions for cars.
//!
//! Mounted at `/cars` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cars;
use crate::state::AppState;

/// ```text
/// POST /                 -> create_car
/// GET  /{id}             -> get_car
/// POST /{id}/move        -> move_car
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cars::create_car))
        .route("/{id}", get(cars::get_car))
        .route("/{id}/move", post(cars::move_car))
}
