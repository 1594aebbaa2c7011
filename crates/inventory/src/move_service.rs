//! Moving cars between floors and receiving ordered cars.
//!
//! Each operation is validated locally and then issued as exactly one
//! atomic backend call. Nothing is retried: a failed write surfaces to the
//! caller with the backend's message, and the caller decides.

use std::sync::Arc;

use dealer_core::error::CoreError;
use dealer_core::floors::{validate_move_destination, validate_receive_destination, Floor};
use dealer_core::types::DbId;
use dealer_db::models::car::Car;

use crate::backend::InventoryBackend;
use crate::error::InventoryError;

/// Issues move and receive writes against an [`InventoryBackend`].
#[derive(Clone)]
pub struct MoveService {
    backend: Arc<dyn InventoryBackend>,
}

impl MoveService {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self { backend }
    }

    /// Move `car` to `destination`.
    ///
    /// Rejected without contacting the backend when `destination` is the
    /// floor the car is known to be on. Returns the backend's updated row.
    pub async fn move_car(&self, car: &Car, destination: Floor) -> Result<Car, InventoryError> {
        validate_move_destination(car.current_floor, destination)?;

        match self.backend.move_car(car.id, destination).await {
            Ok(moved) => {
                tracing::info!(
                    car_id = moved.id,
                    vin = %moved.vin,
                    from = %car.current_floor,
                    to = %moved.current_floor,
                    "Car moved",
                );
                Ok(moved)
            }
            Err(e) => {
                tracing::warn!(
                    car_id = car.id,
                    from = %car.current_floor,
                    to = %destination,
                    error = %e,
                    "Car move failed",
                );
                Err(e)
            }
        }
    }

    /// Look up car `id` and move it to `destination`.
    pub async fn move_car_by_id(
        &self,
        id: DbId,
        destination: Floor,
    ) -> Result<Car, InventoryError> {
        let car = self
            .backend
            .find_car(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Car", id })?;
        self.move_car(&car, destination).await
    }

    /// Receive ordered car `ordered_car_id` onto `destination`.
    ///
    /// `destination` must be one of the receive destinations; anything else
    /// is rejected before the backend call.
    pub async fn receive_ordered_car(
        &self,
        ordered_car_id: DbId,
        destination: Floor,
    ) -> Result<Car, InventoryError> {
        validate_receive_destination(destination)?;

        let car = self
            .backend
            .receive_ordered_car(ordered_car_id, destination)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    ordered_car_id,
                    to = %destination,
                    error = %e,
                    "Receiving ordered car failed",
                );
            })?;

        tracing::info!(
            ordered_car_id,
            car_id = car.id,
            vin = %car.vin,
            to = %car.current_floor,
            "Ordered car received",
        );
        Ok(car)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::InMemoryInventory;

    fn service() -> (Arc<InMemoryInventory>, MoveService) {
        let backend = Arc::new(InMemoryInventory::new());
        let service = MoveService::new(backend.clone());
        (backend, service)
    }

    #[tokio::test]
    async fn moves_car_and_returns_backend_row() {
        let (backend, service) = service();
        let car = backend.seed_car("VIN123", "Model X", Floor::CarInventory);

        let moved = service.move_car(&car, Floor::Schedule).await.unwrap();

        assert_eq!(moved.id, car.id);
        assert_eq!(moved.current_floor, Floor::Schedule);
        assert_eq!(backend.write_calls(), 1);

        let schedule = backend.list_cars(Floor::Schedule).await.unwrap();
        assert_eq!(schedule.iter().filter(|c| c.vin == "VIN123").count(), 1);
        let inventory = backend.list_cars(Floor::CarInventory).await.unwrap();
        assert!(inventory.iter().all(|c| c.vin != "VIN123"));
    }

    #[tokio::test]
    async fn same_floor_is_rejected_without_backend_call() {
        let (backend, service) = service();
        let car = backend.seed_car("VIN200", "Model 3", Floor::Showroom1);

        let result = service.move_car(&car, Floor::Showroom1).await;

        assert_matches!(result, Err(InventoryError::Core(CoreError::Validation(_))));
        assert_eq!(backend.write_calls(), 0);
    }

    #[tokio::test]
    async fn backend_failure_is_not_retried() {
        let (backend, service) = service();
        let car = backend.seed_car("VIN300", "Model Y", Floor::Showroom2);
        backend.set_unavailable(true);

        let result = service.move_car(&car, Floor::GarageInventory).await;

        assert_matches!(result, Err(InventoryError::Unavailable(_)));
        assert_eq!(backend.write_calls(), 1);
    }

    #[tokio::test]
    async fn stale_local_copy_surfaces_backend_conflict() {
        let (backend, service) = service();
        let car = backend.seed_car("VIN400", "Model S", Floor::Showroom1);
        service.move_car(&car, Floor::Showroom2).await.unwrap();

        // `car` still claims SHOWROOM_1; the backend knows better.
        let result = service.move_car(&car, Floor::Showroom2).await;

        assert_matches!(result, Err(InventoryError::Core(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn move_by_unknown_id_is_not_found() {
        let (_, service) = service();
        let result = service.move_car_by_id(999, Floor::Schedule).await;
        assert_matches!(
            result,
            Err(InventoryError::Core(CoreError::NotFound { entity: "Car", id: 999 }))
        );
    }

    #[tokio::test]
    async fn receives_ordered_car_onto_allowed_floor() {
        let (backend, service) = service();
        let order = backend.seed_order("VIN500", "Model X");

        let car = service
            .receive_ordered_car(order.id, Floor::GarageInventory)
            .await
            .unwrap();

        assert_eq!(car.vin, "VIN500");
        assert_eq!(car.current_floor, Floor::GarageInventory);
        assert!(backend.list_pending_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn receive_onto_schedule_is_rejected_before_call() {
        let (backend, service) = service();
        let order = backend.seed_order("VIN600", "Model X");

        let result = service.receive_ordered_car(order.id, Floor::Schedule).await;

        assert_matches!(result, Err(InventoryError::Core(CoreError::Validation(_))));
        assert_eq!(backend.write_calls(), 0);
    }

    #[tokio::test]
    async fn receiving_twice_is_a_conflict() {
        let (backend, service) = service();
        let order = backend.seed_order("VIN700", "Model 3");
        service
            .receive_ordered_car(order.id, Floor::CarInventory)
            .await
            .unwrap();

        let result = service
            .receive_ordered_car(order.id, Floor::Showroom1)
            .await;

        assert_matches!(result, Err(InventoryError::Core(CoreError::Conflict(_))));
    }
}
