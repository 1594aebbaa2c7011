//! WebSocket infrastructure for pushing car changes to browsers.
//!
//! Provides connection management, heartbeat pings and the HTTP upgrade
//! handler used by the `/api/v1/ws` route.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
