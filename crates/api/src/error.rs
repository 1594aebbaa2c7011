use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dealer_core::error::CoreError;
use dealer_inventory::InventoryError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain and workflow errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent `{error, code}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `dealer_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the inventory workflow layer.
    #[error(transparent)]
    Inventory(InventoryError),

    /// A malformed request the extractors rejected.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Core(core) => AppError::Core(core),
            other => AppError::Inventory(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Inventory(err) => match err {
                InventoryError::Core(core) => classify_core_error(core),
                InventoryError::Database(db) => classify_sqlx_error(db),
                InventoryError::Unavailable(msg) => {
                    tracing::warn!(error = %msg, "Inventory backend unavailable");
                    (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE", msg.clone())
                }
                InventoryError::ViewClosed => {
                    tracing::error!("Floor view stopped while serving a request");
                    internal()
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a sqlx error the backend did not already map.
///
/// - `RowNotFound` maps to 404.
/// - Pool exhaustion and I/O failures map to 502.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::warn!(error = %err, "Database unreachable");
            (
                StatusCode::BAD_GATEWAY,
                "BACKEND_UNAVAILABLE",
                "The inventory database is unavailable".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
