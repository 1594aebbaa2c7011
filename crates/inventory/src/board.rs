//! One live view per floor.
//!
//! [`FloorBoard`] keeps a [`FloorView`] for every floor, all fed by the same
//! [`EventBus`], so the number of backend subscriptions does not grow with
//! the number of views or clients.

use std::sync::Arc;

use dealer_core::floors::Floor;
use dealer_events::EventBus;

use crate::backend::InventoryBackend;
use crate::floor_view::FloorView;

pub struct FloorBoard {
    views: Vec<FloorView>,
}

impl FloorBoard {
    /// Spawn a view for each floor in registry order.
    pub fn spawn(backend: Arc<dyn InventoryBackend>, bus: &EventBus) -> Self {
        let views = Floor::ALL
            .into_iter()
            .map(|floor| FloorView::spawn(floor, Arc::clone(&backend), bus))
            .collect();
        Self { views }
    }

    /// The view of `floor`.
    pub fn view(&self, floor: Floor) -> &FloorView {
        // `Floor::ALL` is in declaration order, so the discriminant is the index.
        &self.views[floor as usize]
    }

    /// Stop every view.
    pub async fn shutdown(&self) {
        for view in &self.views {
            view.shutdown().await;
        }
        tracing::info!(views = self.views.len(), "Floor board stopped");
    }
}
