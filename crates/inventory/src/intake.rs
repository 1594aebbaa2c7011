//! Direct entry of cars and pending orders.

use std::sync::Arc;

use dealer_core::error::CoreError;
use dealer_core::validation;
use dealer_db::models::car::{Car, CreateCar};
use dealer_db::models::ordered_car::{CreateOrderedCar, OrderedCar};

use crate::backend::InventoryBackend;
use crate::error::InventoryError;

/// Validates and records new cars and orders.
#[derive(Clone)]
pub struct IntakeService {
    backend: Arc<dyn InventoryBackend>,
}

impl IntakeService {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self { backend }
    }

    /// Enter a car directly onto its floor. The VIN is normalized first.
    pub async fn create_car(&self, mut input: CreateCar) -> Result<Car, InventoryError> {
        input.vin = validation::normalize_vin(&input.vin);
        validate_common(
            &input.vin,
            &[
                ("model", &input.model),
                ("color", &input.color),
                ("category", &input.category),
            ],
            input.client_name.as_deref(),
            input.notes.as_deref(),
        )?;
        if let Some(status) = &input.status {
            validation::validate_attribute("status", status).map_err(CoreError::Validation)?;
        }

        let car = self.backend.create_car(&input).await?;
        tracing::info!(car_id = car.id, vin = %car.vin, floor = %car.current_floor, "Car created");
        Ok(car)
    }

    /// Record a pending arrival.
    pub async fn create_ordered_car(
        &self,
        mut input: CreateOrderedCar,
    ) -> Result<OrderedCar, InventoryError> {
        input.vin = validation::normalize_vin(&input.vin);
        validate_common(
            &input.vin,
            &[
                ("model", &input.model),
                ("color", &input.color),
                ("category", &input.category),
            ],
            input.client_name.as_deref(),
            input.notes.as_deref(),
        )?;

        let order = self.backend.create_ordered_car(&input).await?;
        tracing::info!(ordered_car_id = order.id, vin = %order.vin, "Ordered car recorded");
        Ok(order)
    }
}

fn validate_common(
    vin: &str,
    attributes: &[(&str, &String)],
    client_name: Option<&str>,
    notes: Option<&str>,
) -> Result<(), CoreError> {
    validation::validate_vin(vin).map_err(CoreError::Validation)?;
    for (field, value) in attributes {
        validation::validate_attribute(field, value).map_err(CoreError::Validation)?;
    }
    validation::validate_client_name(client_name).map_err(CoreError::Validation)?;
    validation::validate_notes(notes).map_err(CoreError::Validation)?;
    Ok(())
}
