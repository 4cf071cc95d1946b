//! # Domain Types
//!
//! Core domain types used throughout the landed cost engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Shipment     │   │  ShipmentCost   │   │  PurchaseItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  cost_type      │   │  sku, name      │       │
//! │  │  shipment_number│   │  amount_original│   │  quantity       │       │
//! │  │  shipping_mode  │   │  currency, fx   │   │  dims, weight   │       │
//! │  └─────────────────┘   │  amount_base    │   │  duty_rate      │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CostType     │   │ AllocationBasis │   │  ShippingMode   │       │
//! │  │  FREIGHT        │   │ CHARGEABLE_WEIGHT│  │  AIR   (÷6000)  │       │
//! │  │  INSURANCE      │   │ VALUE           │   │  SEA (÷1000000) │       │
//! │  │  BROKERAGE ...  │   │ UNITS           │   │  COURIER (÷5000)│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (shipment_number, sku, ...) - human-readable

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geometry;

// =============================================================================
// Cost Type
// =============================================================================

/// The kind of charge a shipment cost line represents.
///
/// The cost type decides which allocation basis splits the line across
/// purchase items (see [`AllocationBasis::for_cost_type`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostType {
    Freight,
    Insurance,
    Brokerage,
    Packaging,
    Duty,
    Other,
}

impl CostType {
    /// Stable string form used in the database and audit payloads.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CostType::Freight => "FREIGHT",
            CostType::Insurance => "INSURANCE",
            CostType::Brokerage => "BROKERAGE",
            CostType::Packaging => "PACKAGING",
            CostType::Duty => "DUTY",
            CostType::Other => "OTHER",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREIGHT" => Ok(CostType::Freight),
            "INSURANCE" => Ok(CostType::Insurance),
            "BROKERAGE" => Ok(CostType::Brokerage),
            "PACKAGING" => Ok(CostType::Packaging),
            "DUTY" => Ok(CostType::Duty),
            "OTHER" => Ok(CostType::Other),
            other => Err(format!("unknown cost type: {other}")),
        }
    }
}

// =============================================================================
// Allocation Basis
// =============================================================================

/// The proportional key used to split one cost line across items.
///
/// A closed set of variants: each basis has exactly one allocator in
/// [`crate::allocation`]. New bases require a new variant, not runtime
/// branching in the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationBasis {
    ChargeableWeight,
    Value,
    Units,
}

impl AllocationBasis {
    /// Maps a cost type to the basis that splits it.
    ///
    /// ```text
    /// FREIGHT                      → CHARGEABLE_WEIGHT (carriers bill weight)
    /// INSURANCE, DUTY              → VALUE             (premiums follow value)
    /// BROKERAGE, PACKAGING, OTHER  → UNITS             (administrative flat costs)
    /// ```
    pub const fn for_cost_type(cost_type: CostType) -> Self {
        match cost_type {
            CostType::Freight => AllocationBasis::ChargeableWeight,
            CostType::Insurance | CostType::Duty => AllocationBasis::Value,
            CostType::Brokerage | CostType::Packaging | CostType::Other => {
                AllocationBasis::Units
            }
        }
    }

    /// Stable string form used in the database and audit payloads.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AllocationBasis::ChargeableWeight => "CHARGEABLE_WEIGHT",
            AllocationBasis::Value => "VALUE",
            AllocationBasis::Units => "UNITS",
        }
    }
}

impl fmt::Display for AllocationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHARGEABLE_WEIGHT" => Ok(AllocationBasis::ChargeableWeight),
            "VALUE" => Ok(AllocationBasis::Value),
            "UNITS" => Ok(AllocationBasis::Units),
            other => Err(format!("unknown allocation basis: {other}")),
        }
    }
}

// =============================================================================
// Shipping Mode
// =============================================================================

/// Transport mode of a shipment, deciding the default volumetric divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMode {
    Air,
    Sea,
    Courier,
}

impl ShippingMode {
    /// Mode-specific volumetric divisor (cm³ per kg).
    pub fn divisor(&self) -> Decimal {
        match self {
            ShippingMode::Air => Decimal::from(geometry::DIVISOR_AIR),
            ShippingMode::Sea => Decimal::from(geometry::DIVISOR_SEA),
            ShippingMode::Courier => Decimal::from(geometry::DIVISOR_COURIER),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ShippingMode::Air => "air",
            ShippingMode::Sea => "sea",
            ShippingMode::Courier => "courier",
        }
    }
}

impl fmt::Display for ShippingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air" => Ok(ShippingMode::Air),
            "sea" => Ok(ShippingMode::Sea),
            "courier" => Ok(ShippingMode::Courier),
            other => Err(format!("unknown shipping mode: {other}")),
        }
    }
}

// =============================================================================
// Persistent Entities
// =============================================================================

/// One inbound consignment.
///
/// Read-only to the engine: upstream ingestion creates shipments, the
/// engine only reads them to anchor a recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier shown to operators.
    pub shipment_number: String,

    /// Optional consolidation grouping multiple purchase batches.
    pub consolidation_id: Option<String>,

    /// Transport mode (air, sea, courier).
    pub shipping_mode: ShippingMode,

    /// Carrier name, informational only.
    pub carrier: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cost line attached to a shipment.
///
/// Multiple lines may exist per shipment and per type: two freight
/// invoices, a brokerage fee and a packaging charge, and so on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCost {
    pub id: String,
    pub shipment_id: String,
    pub cost_type: CostType,

    /// Amount in the invoice currency. Invariant: `>= 0`.
    pub amount_original: Decimal,

    /// ISO currency code of `amount_original`.
    pub currency: String,

    /// Exchange rate applied when the line was ingested.
    /// Must be `> 0` when `currency` differs from the base currency.
    pub fx_rate_used: Option<Decimal>,

    /// Amount in the base currency as stored by ingestion.
    /// Used as the fallback when the FX rate is unusable.
    pub amount_base: Decimal,

    /// FREIGHT lines may carry the divisor the carrier bills against.
    pub volumetric_divisor: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

/// A physical packing unit, one-to-one with a purchase item.
///
/// Measured carton data takes precedence over item-level estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCarton {
    pub id: String,
    pub shipment_id: String,
    pub purchase_item_id: String,

    /// Measured gross weight of the whole carton (all units), in kg.
    pub gross_weight_kg: Option<Decimal>,

    pub length_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

impl ShipmentCarton {
    /// True when all three spatial dimensions are present and positive.
    pub fn has_dimensions(&self) -> bool {
        matches!(
            (self.length_cm, self.width_cm, self.height_cm),
            (Some(l), Some(w), Some(h))
                if l > Decimal::ZERO && w > Decimal::ZERO && h > Decimal::ZERO
        )
    }
}

/// A purchased line item awaiting landed costing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: String,
    pub consolidation_id: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub quantity: i64,

    /// Price per unit in the base currency.
    pub unit_price: Option<Decimal>,

    /// Total price for the full quantity; preferred over `unit_price * quantity`.
    pub total_price: Option<Decimal>,

    /// Per-unit weight in kg.
    pub weight_kg: Option<Decimal>,

    /// Per-unit dimensions in cm.
    pub length_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,

    /// Customs duty rate, in percent (10 = 10%).
    pub duty_rate_percent: Option<Decimal>,

    /// Harmonized System code, recorded in the duty audit payload.
    pub hs_code: Option<String>,

    /// Last computed per-unit landed cost. Written only by the engine.
    pub landing_cost_unit_base: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseItem {
    /// Monetary value of the full line: `total_price` when present,
    /// otherwise `unit_price * quantity`, otherwise zero.
    pub fn total_value(&self) -> Decimal {
        if let Some(total) = self.total_price {
            return total;
        }
        match self.unit_price {
            Some(unit) => unit * Decimal::from(self.quantity),
            None => Decimal::ZERO,
        }
    }

    /// Per-unit price: `unit_price` when present, otherwise derived from
    /// `total_price`, otherwise zero.
    pub fn effective_unit_price(&self) -> Decimal {
        if let Some(unit) = self.unit_price {
            return unit;
        }
        match self.total_price {
            Some(total) if self.quantity > 0 => total / Decimal::from(self.quantity),
            _ => Decimal::ZERO,
        }
    }
}

/// A catalog product, matched to purchase items by SKU for cost history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The persisted allocation result: one row per
/// (shipment, purchase item, cost type).
///
/// Rows are replaced wholesale (delete-then-insert) on every
/// recalculation - never incrementally patched - which makes
/// recalculation idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAllocation {
    pub id: String,
    pub shipment_id: String,
    pub purchase_item_id: String,
    pub cost_type: CostType,
    pub basis: AllocationBasis,
    pub amount_allocated_base: Decimal,

    /// JSON audit payload recording the computation inputs and outputs.
    pub details_json: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

/// Append-only time series of per-unit landed costs per catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCostHistoryEntry {
    pub id: String,
    pub product_id: String,
    pub purchase_item_id: String,
    pub landing_cost_unit_base: Decimal,
    pub method: String,
    pub computed_at: DateTime<Utc>,
}

// =============================================================================
// Computation Results (not persisted as their own tables)
// =============================================================================

/// Per-unit cost components of one item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitCosts {
    pub product_cost: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub brokerage: Decimal,
    pub packaging: Decimal,
    pub duty: Decimal,
    pub other: Decimal,
    pub total: Decimal,
}

/// Per-item detail in a [`LandingCostBreakdown`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBreakdown {
    pub purchase_item_id: String,
    pub sku: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_costs: UnitCosts,
    /// `unit_costs.total * quantity`.
    pub total_cost: Decimal,
    pub chargeable_weight: Decimal,
    pub actual_weight: Decimal,
    pub volumetric_weight: Decimal,
}

/// Shipment-level totals by cost type, in the base currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostTotals {
    pub freight: Decimal,
    pub insurance: Decimal,
    pub brokerage: Decimal,
    pub packaging: Decimal,
    pub duty: Decimal,
    pub other: Decimal,
    pub total: Decimal,
}

/// Metadata stamped on every breakdown for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownMetadata {
    pub calculated_at: DateTime<Utc>,
    pub base_currency: String,
    /// Non-base currencies seen on cost lines and the rates actually used.
    pub exchange_rates: BTreeMap<String, Decimal>,
}

/// The full result of one landed cost calculation.
///
/// Returned to the caller; the persisted `cost_allocations`,
/// `product_cost_history`, and `purchase_items.landing_cost_unit_base`
/// values are all derived from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingCostBreakdown {
    pub shipment_id: String,
    pub total_costs: CostTotals,
    pub item_breakdowns: Vec<ItemBreakdown>,
    /// Non-fatal data-quality notes; a non-empty list means the landed
    /// cost is an estimate and must be shown to the operator.
    pub warnings: Vec<String>,
    pub metadata: BreakdownMetadata,
}

/// Result of a pre-flight validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Read-only aggregate over previously persisted allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingCostSummary {
    pub shipment_id: String,
    pub total_cost: Decimal,
    pub item_count: usize,
    pub last_calculated: Option<DateTime<Utc>>,
    pub has_allocations: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cost_type_round_trip() {
        for ct in [
            CostType::Freight,
            CostType::Insurance,
            CostType::Brokerage,
            CostType::Packaging,
            CostType::Duty,
            CostType::Other,
        ] {
            assert_eq!(ct.as_str().parse::<CostType>().unwrap(), ct);
        }
        assert!("CUSTOMS".parse::<CostType>().is_err());
    }

    #[test]
    fn test_basis_for_cost_type() {
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Freight),
            AllocationBasis::ChargeableWeight
        );
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Insurance),
            AllocationBasis::Value
        );
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Duty),
            AllocationBasis::Value
        );
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Brokerage),
            AllocationBasis::Units
        );
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Packaging),
            AllocationBasis::Units
        );
        assert_eq!(
            AllocationBasis::for_cost_type(CostType::Other),
            AllocationBasis::Units
        );
    }

    #[test]
    fn test_shipping_mode_divisors() {
        assert_eq!(ShippingMode::Air.divisor(), dec!(6000));
        assert_eq!(ShippingMode::Sea.divisor(), dec!(1000000));
        assert_eq!(ShippingMode::Courier.divisor(), dec!(5000));
    }

    fn item(quantity: i64, unit: Option<Decimal>, total: Option<Decimal>) -> PurchaseItem {
        let now = Utc::now();
        PurchaseItem {
            id: "item-1".to_string(),
            consolidation_id: None,
            sku: None,
            name: "Widget".to_string(),
            quantity,
            unit_price: unit,
            total_price: total,
            weight_kg: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            duty_rate_percent: None,
            hs_code: None,
            landing_cost_unit_base: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_total_value_prefers_total_price() {
        let it = item(3, Some(dec!(10)), Some(dec!(25)));
        assert_eq!(it.total_value(), dec!(25));
    }

    #[test]
    fn test_total_value_derives_from_unit_price() {
        let it = item(3, Some(dec!(10)), None);
        assert_eq!(it.total_value(), dec!(30));
        assert_eq!(it.effective_unit_price(), dec!(10));
    }

    #[test]
    fn test_effective_unit_price_from_total() {
        let it = item(4, None, Some(dec!(20)));
        assert_eq!(it.effective_unit_price(), dec!(5));
    }

    #[test]
    fn test_missing_prices_default_to_zero() {
        let it = item(4, None, None);
        assert_eq!(it.total_value(), Decimal::ZERO);
        assert_eq!(it.effective_unit_price(), Decimal::ZERO);
    }
}
