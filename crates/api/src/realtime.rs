//! Relay of car change events to WebSocket clients.
//!
//! [`CarChangeRelay`] subscribes to the [`EventBus`](dealer_events::EventBus)
//! and pushes every [`CarChangeEvent`] to all connected browsers as
//! `{"type": "car_change", ...event}`. Browsers filter by floor themselves
//! and fetch the car through `GET /cars/{id}` when they need more than its
//! VIN and floor.

use std::sync::Arc;

use axum::extract::ws::Message;
use dealer_events::CarChangeEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Wire shape of a relayed event.
#[derive(Serialize)]
pub struct CarChangeMessage<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub event: &'a CarChangeEvent,
}

impl<'a> CarChangeMessage<'a> {
    pub fn new(event: &'a CarChangeEvent) -> Self {
        Self {
            kind: "car_change",
            event,
        }
    }
}

/// Forwards bus events to every WebSocket connection.
pub struct CarChangeRelay {
    ws_manager: Arc<WsManager>,
}

impl CarChangeRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until `cancel` fires or the bus is closed.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<CarChangeEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => self.relay(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Car change relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, car change relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: &CarChangeEvent) {
        let payload = match serde_json::to_string(&CarChangeMessage::new(event)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, car_id = event.record.id, "Failed to encode car change");
                return;
            }
        };

        let delivered = self.ws_manager.broadcast(Message::Text(payload.into())).await;
        tracing::debug!(
            car_id = event.record.id,
            floor = %event.affected_floor,
            delivered,
            "Relayed car change",
        );
    }
}
