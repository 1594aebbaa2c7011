use std::sync::Arc;

use dealer_events::{EventBus, FeedStatus};
use dealer_inventory::{FloorBoard, InventoryBackend, IntakeService, MoveService};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// Inventory backend (PostgreSQL in production).
    pub backend: Arc<dyn InventoryBackend>,
    /// Move and receive writes.
    pub moves: MoveService,
    /// Direct entry of cars and orders.
    pub intake: IntakeService,
    /// One live car list per floor.
    pub board: Arc<FloorBoard>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// In-process car change bus fed by the realtime fan-out.
    pub event_bus: Arc<EventBus>,
    /// Connection state of the realtime fan-out.
    pub feed_status: watch::Receiver<FeedStatus>,
}

impl AppState {
    /// Wire the services over `backend` and spawn the floor board.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        backend: Arc<dyn InventoryBackend>,
        event_bus: Arc<EventBus>,
        feed_status: watch::Receiver<FeedStatus>,
        ws_manager: Arc<WsManager>,
        config: ServerConfig,
    ) -> Self {
        let board = Arc::new(FloorBoard::spawn(Arc::clone(&backend), &event_bus));
        Self {
            moves: MoveService::new(Arc::clone(&backend)),
            intake: IntakeService::new(Arc::clone(&backend)),
            backend,
            board,
            config: Arc::new(config),
            ws_manager,
            event_bus,
            feed_status,
        }
    }
}
