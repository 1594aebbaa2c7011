//! Handlers for direct car entry, lookup and moves.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use dealer_core::error::CoreError;
use dealer_core::types::DbId;
use dealer_db::models::car::{CreateCar, MoveCar};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /cars
///
/// Enter a car directly onto a floor.
pub async fn create_car(
    State(state): State<AppState>,
    Json(input): Json<CreateCar>,
) -> AppResult<impl IntoResponse> {
    let car = state.intake.create_car(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: car })))
}

/// GET /cars/{id}
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let car = state
        .backend
        .find_car(id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Car", id }))?;

    Ok(Json(DataResponse { data: car }))
}

/// POST /cars/{id}/move
///
/// Move a car to `destination_floor`. Responds with the backend's updated
/// row; the floor lists catch up through the change feed.
pub async fn move_car(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveCar>,
) -> AppResult<impl IntoResponse> {
    let car = state
        .moves
        .move_car_by_id(id, input.destination_floor)
        .await?;

    Ok(Json(DataResponse { data: car }))
}
