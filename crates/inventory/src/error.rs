use dealer_core::error::CoreError;

/// Errors surfaced by the inventory workflow layer.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A domain-level error (validation, not found, conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An unclassified database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend could not be reached or refused to serve the request.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The floor view task has stopped.
    #[error("Floor view is no longer running")]
    ViewClosed,
}

impl InventoryError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(msg.into()))
    }
}
