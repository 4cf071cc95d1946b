//! # Shipment Validation Service
//!
//! Read-only pre-flight checks over a shipment's data, safe to call
//! repeatedly and before committing to a recalculation.
//!
//! Errors and warnings are kept separate: errors describe inputs that
//! would corrupt or block an allocation (missing shipment, no costs, no
//! items, unusable FX rates), warnings describe gaps the calculation
//! will paper over with estimates (missing dimensions or weights).
//! `is_valid` is true iff there are no errors; warnings never block.

use rust_decimal::Decimal;
use tracing::debug;

use landed_core::validation::validate_cost_inputs;
use landed_core::{PurchaseItem, ShipmentCarton, ValidationReport};
use landed_db::repository::shipment::ShipmentRepository;
use landed_db::Database;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Read-only validation over shipment data.
#[derive(Debug, Clone)]
pub struct ValidationService {
    db: Database,
    base_currency: String,
}

impl ValidationService {
    /// Creates a new validation service.
    pub fn new(db: Database, config: &EngineConfig) -> Self {
        ValidationService {
            db,
            base_currency: config.base_currency.clone(),
        }
    }

    /// Validates a shipment's inputs without writing anything.
    pub async fn validate(&self, shipment_id: &str) -> EngineResult<ValidationReport> {
        debug!(shipment_id = %shipment_id, "Validating shipment data");

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let mut conn = self.db.pool().acquire().await.map_err(landed_db::DbError::from)?;

        let shipment = match ShipmentRepository::get_by_id_with(&mut conn, shipment_id).await? {
            Some(shipment) => shipment,
            None => {
                errors.push(format!("shipment not found: {shipment_id}"));
                return Ok(ValidationReport::new(errors, warnings));
            }
        };

        let costs = ShipmentRepository::costs_for_shipment_with(&mut conn, shipment_id).await?;
        if costs.is_empty() {
            errors.push(format!("shipment {shipment_id}: no cost lines"));
        }
        errors.extend(validate_cost_inputs(&costs, &self.base_currency));

        let cartons =
            ShipmentRepository::cartons_for_shipment_with(&mut conn, shipment_id).await?;
        let mut items = ShipmentRepository::items_via_cartons_with(&mut conn, shipment_id).await?;
        if items.is_empty() {
            if let Some(consolidation_id) = &shipment.consolidation_id {
                items = ShipmentRepository::items_via_consolidation_with(
                    &mut conn,
                    consolidation_id,
                )
                .await?;
            }
        }
        if items.is_empty() {
            errors.push(format!("shipment {shipment_id}: no purchase items"));
        }

        for item in &items {
            let carton = cartons.iter().find(|c| c.purchase_item_id == item.id);
            warnings.extend(physical_data_gaps(item, carton));
        }

        Ok(ValidationReport::new(errors, warnings))
    }
}

/// Lists the estimates the calculation would have to make for one item.
fn physical_data_gaps(item: &PurchaseItem, carton: Option<&ShipmentCarton>) -> Vec<String> {
    let mut gaps = Vec::new();

    let positive = |v: Option<Decimal>| v.filter(|d| *d > Decimal::ZERO).is_some();

    let has_dims = carton.map(|c| c.has_dimensions()).unwrap_or(false)
        || (positive(item.length_cm) && positive(item.width_cm) && positive(item.height_cm));
    if !has_dims {
        gaps.push(format!(
            "item {}: no usable dimensions, defaults will be assumed",
            item.id
        ));
    }

    let has_weight = carton
        .and_then(|c| c.gross_weight_kg)
        .filter(|w| *w > Decimal::ZERO)
        .is_some()
        || positive(item.weight_kg);
    if !has_weight {
        gaps.push(format!(
            "item {}: no usable weight, it will be estimated from volume",
            item.id
        ));
    }

    gaps
}

// =============================================================================
// Unit Tests
// =============================================================================
