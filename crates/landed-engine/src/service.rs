//! # Landing Cost Service
//!
//! The transactional orchestrator: computes and persists the landed cost
//! of every purchase item in a shipment.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              calculate_landing_costs(shipment_id)                       │
//! │                                                                         │
//! │  acquire per-shipment lock                                              │
//! │  BEGIN TRANSACTION                                                      │
//! │   1. load shipment            ── ShipmentNotFound if absent             │
//! │   2. load costs + validate    ── defects become warnings                │
//! │   3. load items               ── cartons first, consolidation fallback, │
//! │                                  NoItemsFound if both empty             │
//! │   4. derive weights           ── carton data > item data > fallback     │
//! │   5. allocate each cost line  ── basis by type, reconcile rounding      │
//! │   6. per-item unit costs      ── allocated shares / quantity            │
//! │   7. CIF + duty               ── duty = CIF × rate, own DUTY rows       │
//! │   8. per-unit landed cost     ── product + all shares + duty            │
//! │   9. persist                  ── replace allocations, update items,     │
//! │                                  append product cost history            │
//! │  COMMIT                                                                 │
//! │  10. return breakdown (totals, per-item detail, warnings, metadata)     │
//! │                                                                         │
//! │  Any error before COMMIT rolls the whole transaction back: previously   │
//! │  persisted allocations stay untouched.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recalculation is idempotent: step 9 always replaces prior rows, so
//! re-running with unchanged inputs yields identical allocations.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use landed_core::{
    allocate, fallback, geometry, reconcile_rounding, validation::validate_cost_inputs,
    AllocationBasis, BreakdownMetadata, CostAllocation, CostTotals, CostType, CurrencyNormalizer,
    ItemBreakdown, ItemMeasure, LandingCostBreakdown, LandingCostSummary, ProductCostHistoryEntry,
    PurchaseItem, Shipment, ShipmentCarton, ShipmentCost, UnitCosts,
};
use landed_db::repository::allocation::AllocationRepository;
use landed_db::repository::product::ProductRepository;
use landed_db::repository::shipment::ShipmentRepository;
use landed_db::{Database, DbError};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::lock::ShipmentLockRegistry;

/// Method tag written to product cost history rows.
const COST_HISTORY_METHOD: &str = "landed_cost_allocation";

/// Orchestrates landed cost calculation and persistence.
#[derive(Debug, Clone)]
pub struct LandingCostService {
    db: Database,
    normalizer: CurrencyNormalizer,
    locks: ShipmentLockRegistry,
}

impl LandingCostService {
    /// Creates a new service over an open database.
    pub fn new(db: Database, config: &EngineConfig) -> Self {
        LandingCostService {
            db,
            normalizer: CurrencyNormalizer::new(config.base_currency.clone()),
            locks: ShipmentLockRegistry::new(),
        }
    }

    /// The base currency all results are expressed in.
    pub fn base_currency(&self) -> &str {
        self.normalizer.base_currency()
    }

    /// Computes and persists landed costs for one shipment.
    ///
    /// Runs the full workflow inside one transaction, serialized per
    /// shipment. Data-quality problems surface in the returned
    /// breakdown's `warnings`; only a missing shipment, a shipment with
    /// no items, or a database failure abort.
    pub async fn calculate_landing_costs(
        &self,
        shipment_id: &str,
    ) -> EngineResult<LandingCostBreakdown> {
        let _guard = self.locks.acquire(shipment_id).await;

        info!(shipment_id = %shipment_id, "Calculating landing costs");

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let mut warnings: Vec<String> = Vec::new();
        let now = Utc::now();

        // 1. Shipment
        let shipment = ShipmentRepository::get_by_id_with(&mut tx, shipment_id)
            .await?
            .ok_or_else(|| EngineError::ShipmentNotFound(shipment_id.to_string()))?;

        // 2. Costs; input defects degrade into warnings
        let costs = ShipmentRepository::costs_for_shipment_with(&mut tx, shipment_id).await?;
        if costs.is_empty() {
            warnings.push(format!(
                "shipment {shipment_id}: no cost lines, landed cost equals product cost"
            ));
        }
        warnings.extend(validate_cost_inputs(&costs, self.base_currency()));

        // 3. Items
        let cartons = ShipmentRepository::cartons_for_shipment_with(&mut tx, shipment_id).await?;
        let items = self.load_items(&mut tx, &shipment).await?;
        debug!(
            items = items.len(),
            cartons = cartons.len(),
            costs = costs.len(),
            "Shipment data loaded"
        );

        // 4. Physical measures
        let divisor = volumetric_divisor(&shipment, &costs);
        let cartons_by_item: HashMap<&str, &ShipmentCarton> = cartons
            .iter()
            .map(|c| (c.purchase_item_id.as_str(), c))
            .collect();
        let measures: Vec<ItemMeasure> = items
            .iter()
            .map(|item| {
                derive_measure(
                    item,
                    cartons_by_item.get(item.id.as_str()).copied(),
                    divisor,
                    &mut warnings,
                )
            })
            .collect();

        // 5. Allocate every cost line
        let mut allocations: Vec<CostAllocation> = Vec::new();
        let mut per_item: HashMap<(String, CostType), Decimal> = HashMap::new();
        let mut totals = CostTotals::default();
        let mut exchange_rates: BTreeMap<String, Decimal> = BTreeMap::new();

        for cost in &costs {
            let amount_base = match self.normalizer.to_base(
                cost.amount_original,
                &cost.currency,
                cost.fx_rate_used,
            ) {
                Ok(amount) => {
                    if cost.currency != self.base_currency() {
                        if let Some(rate) = cost.fx_rate_used {
                            exchange_rates.insert(cost.currency.clone(), rate);
                        }
                    }
                    amount
                }
                Err(e) => {
                    warn!(cost_id = %cost.id, error = %e, "FX conversion failed");
                    warnings.push(format!(
                        "cost {}: {e}; using stored base amount {}",
                        cost.id, cost.amount_base
                    ));
                    cost.amount_base
                }
            };

            let basis = AllocationBasis::for_cost_type(cost.cost_type);
            let shares = allocate(basis, &measures, amount_base, &mut warnings);
            let shares = reconcile_rounding(shares, amount_base);
            if shares.is_empty() {
                continue;
            }

            add_to_totals(&mut totals, cost.cost_type, amount_base);

            for share in shares {
                *per_item
                    .entry((share.purchase_item_id.clone(), cost.cost_type))
                    .or_default() += share.amount;

                allocations.push(CostAllocation {
                    id: Uuid::new_v4().to_string(),
                    shipment_id: shipment_id.to_string(),
                    purchase_item_id: share.purchase_item_id,
                    cost_type: cost.cost_type,
                    basis,
                    amount_allocated_base: share.amount,
                    details_json: allocation_details(cost, basis, amount_base, items.len()),
                    created_at: now,
                });
            }
        }

        // 6-8. Per-item unit costs, CIF, duty, landed cost
        let mut item_breakdowns: Vec<ItemBreakdown> = Vec::with_capacity(items.len());
        for (item, measure) in items.iter().zip(&measures) {
            let quantity = Decimal::from(item.quantity);
            let per_unit = |total: Decimal| {
                if quantity > Decimal::ZERO {
                    total / quantity
                } else {
                    Decimal::ZERO
                }
            };
            let allocated = |cost_type: CostType| {
                per_item
                    .get(&(item.id.clone(), cost_type))
                    .copied()
                    .unwrap_or_default()
            };

            let freight = per_unit(allocated(CostType::Freight));
            let insurance = per_unit(allocated(CostType::Insurance));
            let brokerage = per_unit(allocated(CostType::Brokerage));
            let packaging = per_unit(allocated(CostType::Packaging));
            let other = per_unit(allocated(CostType::Other));
            let duty_from_lines = per_unit(allocated(CostType::Duty));

            let product_cost = item.effective_unit_price();
            let cif = product_cost + freight + insurance;

            // Duty from the item's own rate gets dedicated rows; duty
            // charged as a broker cost line was already allocated above.
            let duty_from_rate = match item.duty_rate_percent.filter(|r| *r > Decimal::ZERO) {
                Some(rate) => cif * rate / Decimal::from(100),
                None => Decimal::ZERO,
            };
            if duty_from_rate > Decimal::ZERO && quantity > Decimal::ZERO {
                let duty_total = duty_from_rate * quantity;
                add_to_totals(&mut totals, CostType::Duty, duty_total);
                allocations.push(CostAllocation {
                    id: Uuid::new_v4().to_string(),
                    shipment_id: shipment_id.to_string(),
                    purchase_item_id: item.id.clone(),
                    cost_type: CostType::Duty,
                    basis: AllocationBasis::Value,
                    amount_allocated_base: duty_total,
                    details_json: serde_json::json!({
                        "method": "duty_from_cif",
                        "cif_per_unit": cif.to_string(),
                        "duty_rate_percent": item.duty_rate_percent.map(|r| r.to_string()),
                        "hs_code": item.hs_code,
                        "quantity": item.quantity,
                    }),
                    created_at: now,
                });
            }

            let duty = duty_from_lines + duty_from_rate;
            let total =
                product_cost + freight + insurance + brokerage + packaging + duty + other;

            item_breakdowns.push(ItemBreakdown {
                purchase_item_id: item.id.clone(),
                sku: item.sku.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_costs: UnitCosts {
                    product_cost,
                    freight,
                    insurance,
                    brokerage,
                    packaging,
                    duty,
                    other,
                    total,
                },
                total_cost: total * quantity,
                chargeable_weight: measure.chargeable_weight,
                actual_weight: measure.actual_weight,
                volumetric_weight: measure.volumetric_weight,
            });
        }
        totals.total = totals.freight
            + totals.insurance
            + totals.brokerage
            + totals.packaging
            + totals.duty
            + totals.other;

        // 9. Persist: replace allocations, write unit costs, append history
        AllocationRepository::replace_for_shipment_with(&mut tx, shipment_id, &allocations)
            .await?;

        for (item, breakdown) in items.iter().zip(&item_breakdowns) {
            ShipmentRepository::update_landing_cost_with(
                &mut tx,
                &item.id,
                breakdown.unit_costs.total,
            )
            .await?;

            if let Some(sku) = &item.sku {
                if let Some(product) = ProductRepository::find_by_sku_with(&mut tx, sku).await? {
                    ProductRepository::append_cost_history_with(
                        &mut tx,
                        &ProductCostHistoryEntry {
                            id: Uuid::new_v4().to_string(),
                            product_id: product.id,
                            purchase_item_id: item.id.clone(),
                            landing_cost_unit_base: breakdown.unit_costs.total,
                            method: COST_HISTORY_METHOD.to_string(),
                            computed_at: now,
                        },
                    )
                    .await?;
                }
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            shipment_id = %shipment_id,
            allocations = allocations.len(),
            warnings = warnings.len(),
            total = %totals.total,
            "Landing costs persisted"
        );

        // 10. Breakdown
        Ok(LandingCostBreakdown {
            shipment_id: shipment_id.to_string(),
            total_costs: totals,
            item_breakdowns,
            warnings,
            metadata: BreakdownMetadata {
                calculated_at: now,
                base_currency: self.base_currency().to_string(),
                exchange_rates,
            },
        })
    }

    /// Recomputes landed costs for a shipment whose inputs changed.
    ///
    /// Semantically identical to [`calculate_landing_costs`]; a named
    /// entry point for callers that explicitly mean "redo this".
    ///
    /// [`calculate_landing_costs`]: LandingCostService::calculate_landing_costs
    pub async fn recalculate_landing_costs(
        &self,
        shipment_id: &str,
    ) -> EngineResult<LandingCostBreakdown> {
        info!(shipment_id = %shipment_id, "Recalculating landing costs");
        self.calculate_landing_costs(shipment_id).await
    }

    /// Read-only aggregate over previously persisted allocations.
    ///
    /// Never triggers a computation.
    pub async fn get_landing_cost_summary(
        &self,
        shipment_id: &str,
    ) -> EngineResult<LandingCostSummary> {
        self.db
            .shipments()
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| EngineError::ShipmentNotFound(shipment_id.to_string()))?;

        let summary = self.db.allocations().summary_for_shipment(shipment_id).await?;
        Ok(summary)
    }

    /// Loads the shipment's purchase items.
    ///
    /// Carton-linked items come first; a shipment without cartons falls
    /// back to its consolidation. Both empty is a hard error.
    async fn load_items(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        shipment: &Shipment,
    ) -> EngineResult<Vec<PurchaseItem>> {
        let mut items = ShipmentRepository::items_via_cartons_with(tx, &shipment.id).await?;

        if items.is_empty() {
            if let Some(consolidation_id) = &shipment.consolidation_id {
                items =
                    ShipmentRepository::items_via_consolidation_with(tx, consolidation_id).await?;
            }
        }

        if items.is_empty() {
            return Err(EngineError::NoItemsFound(shipment.id.clone()));
        }

        Ok(items)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Picks the volumetric divisor: a FREIGHT line may carry the divisor the
/// carrier actually billed against; otherwise the shipping mode decides.
fn volumetric_divisor(shipment: &Shipment, costs: &[ShipmentCost]) -> Decimal {
    costs
        .iter()
        .filter(|c| c.cost_type == CostType::Freight)
        .find_map(|c| c.volumetric_divisor.filter(|d| *d > Decimal::ZERO))
        .unwrap_or_else(|| shipment.shipping_mode.divisor())
}

/// Derives physical measures for one item.
///
/// Measured carton data covers the full quantity and takes precedence;
/// item-level figures are per unit and get scaled by quantity; the
/// fallback resolver fills whatever is left.
fn derive_measure(
    item: &PurchaseItem,
    carton: Option<&ShipmentCarton>,
    divisor: Decimal,
    warnings: &mut Vec<String>,
) -> ItemMeasure {
    let quantity = Decimal::from(item.quantity.max(0));

    let carton_dims = carton.filter(|c| c.has_dimensions());
    let carton_weight = carton
        .and_then(|c| c.gross_weight_kg)
        .filter(|w| *w > Decimal::ZERO);
    let item_weight = item.weight_kg.filter(|w| *w > Decimal::ZERO);

    let (actual, volumetric) = match carton_dims {
        Some(c) => {
            let length = c.length_cm.unwrap_or_default();
            let width = c.width_cm.unwrap_or_default();
            let height = c.height_cm.unwrap_or_default();
            let volumetric = geometry::volumetric_weight(length, width, height, divisor, warnings);

            let actual = match (carton_weight, item_weight) {
                (Some(w), _) => w,
                (None, Some(w)) => w * quantity,
                (None, None) => {
                    let volume_m3 = (length * width * height) / Decimal::from(1_000_000);
                    let estimated =
                        volume_m3 * Decimal::from(fallback::FALLBACK_DENSITY_KG_PER_M3);
                    warnings.push(format!(
                        "item {}: missing weight, estimated {estimated} kg from carton volume",
                        item.id
                    ));
                    estimated
                }
            };
            (actual, volumetric)
        }
        None => {
            // No measured carton dimensions: item-level data per unit,
            // gap-filled by the resolver. A carton gross weight still
            // wins over the resolved estimate when present.
            let weight_hint = item_weight.or_else(|| {
                carton_weight.map(|w| {
                    if quantity > Decimal::ZERO {
                        w / quantity
                    } else {
                        w
                    }
                })
            });
            let resolved = fallback::resolve_dimensions(
                &item.id,
                item.length_cm,
                item.width_cm,
                item.height_cm,
                weight_hint,
                warnings,
            );
            let volumetric = geometry::volumetric_weight(
                resolved.length_cm,
                resolved.width_cm,
                resolved.height_cm,
                divisor,
                warnings,
            ) * quantity;
            let actual = carton_weight.unwrap_or(resolved.weight_kg * quantity);
            (actual, volumetric)
        }
    };

    ItemMeasure {
        purchase_item_id: item.id.clone(),
        chargeable_weight: geometry::chargeable_weight(actual, volumetric),
        actual_weight: actual,
        volumetric_weight: volumetric,
        unit_price: item.effective_unit_price(),
        quantity: item.quantity,
        total_value: item.total_value(),
    }
}

fn add_to_totals(totals: &mut CostTotals, cost_type: CostType, amount: Decimal) {
    match cost_type {
        CostType::Freight => totals.freight += amount,
        CostType::Insurance => totals.insurance += amount,
        CostType::Brokerage => totals.brokerage += amount,
        CostType::Packaging => totals.packaging += amount,
        CostType::Duty => totals.duty += amount,
        CostType::Other => totals.other += amount,
    }
}

/// Audit payload persisted with each allocation row.
fn allocation_details(
    cost: &ShipmentCost,
    basis: AllocationBasis,
    amount_base: Decimal,
    item_count: usize,
) -> serde_json::Value {
    serde_json::json!({
        "method": basis.as_str(),
        "cost_id": cost.id,
        "cost_type": cost.cost_type.as_str(),
        "amount_original": cost.amount_original.to_string(),
        "currency": cost.currency,
        "fx_rate_used": cost.fx_rate_used.map(|r| r.to_string()),
        "amount_base": amount_base.to_string(),
        "item_count": item_count,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use landed_core::ShippingMode;
    use rust_decimal_macros::dec;

    fn item(id: &str, quantity: i64) -> PurchaseItem {
        let now = Utc::now();
        PurchaseItem {
            id: id.to_string(),
            consolidation_id: None,
            sku: None,
            name: "Test item".to_string(),
            quantity,
            unit_price: Some(dec!(10)),
            total_price: None,
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

    fn carton(item_id: &str, gross: Option<Decimal>, dims: Option<(Decimal, Decimal, Decimal)>) -> ShipmentCarton {
        ShipmentCarton {
            id: format!("carton-{item_id}"),
            shipment_id: "shp-1".to_string(),
            purchase_item_id: item_id.to_string(),
            gross_weight_kg: gross,
            length_cm: dims.map(|d| d.0),
            width_cm: dims.map(|d| d.1),
            height_cm: dims.map(|d| d.2),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_carton_measures_take_precedence() {
        let mut it = item("item-1", 10);
        it.weight_kg = Some(dec!(1)); // would give 10 kg total
        let c = carton("item-1", Some(dec!(42)), Some((dec!(60), dec!(40), dec!(40))));

        let mut warnings = Vec::new();
        let m = derive_measure(&it, Some(&c), dec!(6000), &mut warnings);

        assert_eq!(m.actual_weight, dec!(42));
        // 60*40*40/6000 = 16, once per carton (not per unit)
        assert_eq!(m.volumetric_weight, dec!(16));
        assert_eq!(m.chargeable_weight, dec!(42));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_item_dimensions_scale_by_quantity() {
        let mut it = item("item-2", 4);
        it.weight_kg = Some(dec!(2));
        it.length_cm = Some(dec!(30));
        it.width_cm = Some(dec!(20));
        it.height_cm = Some(dec!(10));

        let mut warnings = Vec::new();
        let m = derive_measure(&it, None, dec!(6000), &mut warnings);

        assert_eq!(m.actual_weight, dec!(8));
        // 30*20*10/6000 = 1 per unit, 4 units
        assert_eq!(m.volumetric_weight, dec!(4));
        assert_eq!(m.chargeable_weight, dec!(8));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_everything_uses_fallback_with_warnings() {
        let it = item("item-3", 2);
        let mut warnings = Vec::new();
        let m = derive_measure(&it, None, dec!(6000), &mut warnings);

        // Defaults: 20x15x10 → volumetric 0.5/unit, weight 0.6 kg/unit
        assert_eq!(m.volumetric_weight, dec!(1.0));
        assert_eq!(m.actual_weight, dec!(1.2));
        assert_eq!(m.chargeable_weight, dec!(1.2));
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.contains("item-3")));
    }

    #[test]
    fn test_carton_weight_without_dims_suppresses_weight_fallback() {
        let it = item("item-4", 5);
        let c = carton("item-4", Some(dec!(25)), None);

        let mut warnings = Vec::new();
        let m = derive_measure(&it, Some(&c), dec!(6000), &mut warnings);

        assert_eq!(m.actual_weight, dec!(25));
        // Only the dimension substitution warns; weight came from the carton.
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing dimensions"));
    }

    #[test]
    fn test_freight_line_divisor_wins_over_mode() {
        let now = Utc::now();
        let shipment = Shipment {
            id: "shp-1".to_string(),
            shipment_number: "SHP-1".to_string(),
            consolidation_id: None,
            shipping_mode: ShippingMode::Air,
            carrier: None,
            created_at: now,
            updated_at: now,
        };
        let freight = ShipmentCost {
            id: "cost-1".to_string(),
            shipment_id: "shp-1".to_string(),
            cost_type: CostType::Freight,
            amount_original: dec!(100),
            currency: "EUR".to_string(),
            fx_rate_used: None,
            amount_base: dec!(100),
            volumetric_divisor: Some(dec!(5000)),
            created_at: now,
        };

        assert_eq!(volumetric_divisor(&shipment, &[freight]), dec!(5000));
        assert_eq!(volumetric_divisor(&shipment, &[]), dec!(6000));
    }
}
