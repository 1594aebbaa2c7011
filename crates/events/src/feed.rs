//! Push subscription to the `cars` change feed.
//!
//! [`ChangeFeed`] abstracts the backend's change notifications so the
//! fan-out can be driven by PostgreSQL in production and by scripted feeds
//! in tests. [`PgChangeFeed`] listens on the channel the
//! `trg_cars_notify_change` trigger publishes to.

use async_trait::async_trait;
use dealer_db::DbPool;
use futures::stream::BoxStream;
use futures::StreamExt;
use sqlx::postgres::PgListener;

use crate::change::ChangeNotification;

/// Channel the `notify_car_change()` trigger publishes on.
pub const CAR_CHANGES_CHANNEL: &str = "car_changes";

/// Errors raised while subscribing to or reading the change feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The subscription could not be established or was lost.
    #[error("Change feed connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// A single notification could not be decoded. The subscription itself
    /// is still healthy.
    #[error("Malformed change notification: {0}")]
    Malformed(String),
}

/// Stream of notifications for one live subscription.
///
/// The stream ends when the subscription is lost.
pub type ChangeStream = BoxStream<'static, Result<ChangeNotification, FeedError>>;

/// A source of car change notifications.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open one subscription to the feed.
    async fn subscribe(&self) -> Result<ChangeStream, FeedError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Change feed backed by PostgreSQL `LISTEN car_changes`.
pub struct PgChangeFeed {
    pool: DbPool,
}

impl PgChangeFeed {
    /// Create a feed that opens its listener connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self) -> Result<ChangeStream, FeedError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CAR_CHANGES_CHANNEL).await?;
        tracing::debug!(channel = CAR_CHANGES_CHANNEL, "Listening for car changes");

        let stream = listener.into_stream().map(|item| {
            let notification = item?;
            parse_payload(notification.payload())
        });

        Ok(stream.boxed())
    }
}

/// Decode a `car_changes` payload.
pub fn parse_payload(payload: &str) -> Result<ChangeNotification, FeedError> {
    serde_json::from_str(payload).map_err(|e| FeedError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
