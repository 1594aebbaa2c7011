//! Car change feed and realtime fan-out.
//!
//! This crate turns the database's per-row change notifications into typed,
//! locally broadcast events:
//!
//! - [`ChangeFeed`]: a push subscription to the `cars` change feed, with
//!   [`PgChangeFeed`] reading PostgreSQL `LISTEN/NOTIFY`.
//! - [`CarChangeEvent`]: the translated `{change_kind, affected_floor,
//!   record}` event every consumer receives, where `record` is a [`CarRef`].
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, behind the [`EventSink`] trait.
//! - [`RealtimeFanout`]: the single owned subscription that pumps the feed
//!   into a sink, reconnecting with exponential backoff.

pub mod bus;
pub mod change;
pub mod fanout;
pub mod feed;
pub mod reconnect;

pub use bus::{EventBus, EventSink};
pub use change::{CarChangeEvent, CarRef, ChangeKind, ChangeNotification};
pub use fanout::{FanoutError, FeedStatus, RealtimeFanout};
pub use feed::{ChangeFeed, ChangeStream, FeedError, PgChangeFeed};
pub use reconnect::{Backoff, ReconnectConfig};
