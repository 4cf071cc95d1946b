//! # Cost Input Validation
//!
//! Pure checks over shipment cost lines, run before a calculation to
//! catch data problems early. The engine folds these messages into its
//! validation report; nothing here touches the database.

use rust_decimal::Decimal;

use crate::types::{CostType, ShipmentCost};

/// Checks cost lines for data problems that would corrupt an allocation.
///
/// Returns one message per defect found. An empty vector means the cost
/// lines are fit to allocate.
pub fn validate_cost_inputs(costs: &[ShipmentCost], base_currency: &str) -> Vec<String> {
    let mut issues = Vec::new();

    for cost in costs {
        let label = cost.cost_type.as_str();

        if cost.amount_original < Decimal::ZERO {
            issues.push(format!(
                "{label} cost {}: negative original amount {}",
                cost.id, cost.amount_original
            ));
        }

        if cost.currency.trim().is_empty() {
            issues.push(format!("{label} cost {}: missing currency code", cost.id));
        } else if cost.currency != base_currency {
            match cost.fx_rate_used {
                Some(rate) if rate > Decimal::ZERO => {}
                _ => issues.push(format!(
                    "{label} cost {}: currency {} has no positive FX rate to {base_currency}",
                    cost.id, cost.currency
                )),
            }
        }

        if cost.cost_type == CostType::Freight {
            if let Some(divisor) = cost.volumetric_divisor {
                if divisor <= Decimal::ZERO {
                    issues.push(format!(
                        "{label} cost {}: non-positive volumetric divisor {divisor}",
                        cost.id
                    ));
                }
            }
        }
    }

    issues
}

// =============================================================================
// Unit Tests
// =============================================================================
