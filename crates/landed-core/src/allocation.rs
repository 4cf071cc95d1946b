//! # Cost Allocation
//!
//! Distributes a shipment-level cost across purchase items according to
//! an allocation basis, then reconciles rounding so the shares sum to
//! the cost exactly.
//!
//! ## Allocation Bases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CHARGEABLE_WEIGHT  share_i = total * weight_i / Σ weight               │
//! │  VALUE              share_i = total * value_i  / Σ value                │
//! │  UNITS              share_i = total * qty_i    / Σ qty                  │
//! │                                                                         │
//! │  Zero denominator?  WEIGHT and VALUE fall back to UNITS with a          │
//! │  warning; UNITS with zero total quantity allocates nothing.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Reconciliation
//! Raw proportional shares carry full precision. [`reconcile_rounding`]
//! rounds each share half-up to 4 decimal places and adds the residual
//! (total minus rounded sum) to the largest share, so
//! `Σ rounded shares == total` holds exactly.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::AllocationBasis;
use crate::MONEY_SCALE;

/// Per-item measures feeding the allocation denominators.
///
/// Weight fields are already per-item totals (unit weight times
/// quantity), not per-unit figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeasure {
    pub purchase_item_id: String,
    /// max(actual, volumetric) for all units of this item, in kg.
    pub chargeable_weight: Decimal,
    pub actual_weight: Decimal,
    pub volumetric_weight: Decimal,
    pub unit_price: Decimal,
    pub quantity: i64,
    /// Declared value of all units, in base currency.
    pub total_value: Decimal,
}

/// One item's slice of an allocated cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationShare {
    pub purchase_item_id: String,
    pub amount: Decimal,
}

/// Splits `total` across `items` according to `basis`.
///
/// Shares are raw (unrounded) proportions; callers reconcile them with
/// [`reconcile_rounding`] before persisting. Degenerate denominators
/// fall back rather than fail, pushing a warning.
pub fn allocate(
    basis: AllocationBasis,
    items: &[ItemMeasure],
    total: Decimal,
    warnings: &mut Vec<String>,
) -> Vec<AllocationShare> {
    if items.is_empty() || total == Decimal::ZERO {
        return Vec::new();
    }

    match basis {
        AllocationBasis::ChargeableWeight => by_chargeable_weight(items, total, warnings),
        AllocationBasis::Value => by_value(items, total, warnings),
        AllocationBasis::Units => by_units(items, total, warnings),
    }
}

fn by_chargeable_weight(
    items: &[ItemMeasure],
    total: Decimal,
    warnings: &mut Vec<String>,
) -> Vec<AllocationShare> {
    let denominator: Decimal = items.iter().map(|i| i.chargeable_weight).sum();
    if denominator <= Decimal::ZERO {
        warnings.push(
            "total chargeable weight is zero; falling back to per-unit allocation".to_string(),
        );
        return by_units(items, total, warnings);
    }

    items
        .iter()
        .map(|i| AllocationShare {
            purchase_item_id: i.purchase_item_id.clone(),
            amount: total * i.chargeable_weight / denominator,
        })
        .collect()
}

fn by_value(items: &[ItemMeasure], total: Decimal, warnings: &mut Vec<String>) -> Vec<AllocationShare> {
    let denominator: Decimal = items.iter().map(|i| i.total_value).sum();
    if denominator <= Decimal::ZERO {
        warnings
            .push("total declared value is zero; falling back to per-unit allocation".to_string());
        return by_units(items, total, warnings);
    }

    items
        .iter()
        .map(|i| AllocationShare {
            purchase_item_id: i.purchase_item_id.clone(),
            amount: total * i.total_value / denominator,
        })
        .collect()
}

fn by_units(items: &[ItemMeasure], total: Decimal, warnings: &mut Vec<String>) -> Vec<AllocationShare> {
    let denominator: Decimal = items.iter().map(|i| Decimal::from(i.quantity)).sum();
    if denominator <= Decimal::ZERO {
        warnings.push("total quantity is zero; nothing to allocate against".to_string());
        return Vec::new();
    }

    items
        .iter()
        .map(|i| AllocationShare {
            purchase_item_id: i.purchase_item_id.clone(),
            amount: total * Decimal::from(i.quantity) / denominator,
        })
        .collect()
}

/// Rounds each share half-up to 4 decimal places and pins the residual
/// onto the largest share so the rounded shares sum to `total` exactly.
///
/// With an empty input this returns an empty vector; the residual has
/// nowhere to go and the caller allocated nothing anyway.
pub fn reconcile_rounding(shares: Vec<AllocationShare>, total: Decimal) -> Vec<AllocationShare> {
    if shares.is_empty() {
        return shares;
    }

    let mut rounded: Vec<AllocationShare> = shares
        .into_iter()
        .map(|s| AllocationShare {
            purchase_item_id: s.purchase_item_id,
            amount: s
                .amount
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        })
        .collect();

    let rounded_sum: Decimal = rounded.iter().map(|s| s.amount).sum();
    let residual = total - rounded_sum;

    if residual != Decimal::ZERO {
        // Largest share absorbs the residual: the relative distortion is
        // smallest there, and the choice is deterministic.
        let largest = rounded
            .iter_mut()
            .enumerate()
            .max_by(|(ai, a), (bi, b)| a.amount.cmp(&b.amount).then(bi.cmp(ai)))
            .map(|(_, s)| s);
        if let Some(share) = largest {
            share.amount += residual;
        }
    }

    rounded
}

// =============================================================================
// Unit Tests
// =============================================================================
