//! Handlers for pending arrivals.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use dealer_core::types::DbId;
use dealer_db::models::ordered_car::{CreateOrderedCar, ReceiveOrderedCar};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /ordered-cars
///
/// Orders not yet received, soonest expected first.
pub async fn list_pending(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let orders = state.backend.list_pending_orders().await?;
    Ok(Json(DataResponse { data: orders }))
}

/// POST /ordered-cars
pub async fn create_ordered_car(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderedCar>,
) -> AppResult<impl IntoResponse> {
    let order = state.intake.create_ordered_car(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// POST /ordered-cars/{id}/receive
///
/// Convert the order into a car on `destination_floor`. Responds with the
/// new car.
pub async fn receive_ordered_car(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReceiveOrderedCar>,
) -> AppResult<impl IntoResponse> {
    let car = state
        .moves
        .receive_ordered_car(id, input.destination_floor)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: car })))
}
