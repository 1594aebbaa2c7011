//! Route definitions for ordered (pending arrival) cars.
//!
//! Mounted at `/ordered-cars` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ordered_cars;
use crate::state::AppState;

/// ```text
/// GET  /                 -> list_pending
/// POST /                 -> create_ordered_car
/// POST /{id}/receive     -> receive_ordered_car
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(ordered_cars::list_pending).post(ordered_cars::create_ordered_car),
        )
        .route("/{id}/receive", post(ordered_cars::receive_ordered_car))
}
