//! Client-side inventory workflow: moving cars between floors, keeping
//! per-floor car lists fresh, and narrowing/ordering those lists.
//!
//! - [`InventoryBackend`]: the read/write contract with the backend, with
//!   [`PgInventory`] as the PostgreSQL implementation.
//! - [`MoveService`]: one atomic backend call per move or receipt.
//! - [`IntakeService`]: direct entry of cars and pending orders.
//! - [`FloorView`] / [`FloorBoard`]: cached, event-refreshed car lists.
//! - [`filter`] / [`sort`]: pure list utilities.

pub mod backend;
pub mod board;
pub mod error;
pub mod filter;
pub mod floor_view;
pub mod intake;
pub mod move_service;
pub mod sort;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use backend::{InventoryBackend, PgInventory};
pub use board::FloorBoard;
pub use error::InventoryError;
pub use floor_view::{FloorView, FloorViewState, LoadStatus};
pub use intake::IntakeService;
pub use move_service::MoveService;
