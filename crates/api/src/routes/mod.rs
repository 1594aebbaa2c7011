pub mod cars;
pub mod floors;
pub mod health;
pub mod ordered_cars;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                   WebSocket (car change relay)
///
/// /floors                               floor registry
/// /floors/{floor}/cars                  live car list (filter, sort, refresh)
///
/// /cars                                 create
/// /cars/{id}                            get
/// /cars/{id}/move                       move to another floor (POST)
///
/// /ordered-cars                         list pending, create
/// /ordered-cars/{id}/receive            receive onto a floor (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/floors", floors::router())
        .nest("/cars", cars::router())
        .nest("/ordered-cars", ordered_cars::router())
}
