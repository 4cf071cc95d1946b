//! End-to-end tests for the landed cost workflow against an in-memory
//! SQLite database: allocation proportions, rounding invariants,
//! fallback estimation, duty, idempotent recalculation, summaries, and
//! pre-flight validation.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use landed_core::{
    AllocationBasis, CostType, Product, PurchaseItem, Shipment, ShipmentCarton, ShipmentCost,
    ShippingMode,
};
use landed_db::{Database, DbConfig};
use landed_engine::{init_tracing, EngineConfig, EngineError, LandingCostService, ValidationService};

// =============================================================================
// Fixtures
// =============================================================================

struct Fixture {
    db: Database,
    service: LandingCostService,
    validator: ValidationService,
}

async fn fixture() -> Fixture {
    init_tracing();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = EngineConfig::default();
    let service = LandingCostService::new(db.clone(), &config);
    let validator = ValidationService::new(db.clone(), &config);
    Fixture {
        db,
        service,
        validator,
    }
}

fn shipment(id: &str, consolidation_id: Option<&str>) -> Shipment {
    let now = Utc::now();
    Shipment {
        id: id.to_string(),
        shipment_number: format!("SHP-{id}"),
        consolidation_id: consolidation_id.map(str::to_string),
        shipping_mode: ShippingMode::Air,
        carrier: None,
        created_at: now,
        updated_at: now,
    }
}

fn cost(
    shipment_id: &str,
    cost_type: CostType,
    amount_original: Decimal,
    currency: &str,
    fx_rate_used: Option<Decimal>,
    amount_base: Decimal,
) -> ShipmentCost {
    ShipmentCost {
        id: Uuid::new_v4().to_string(),
        shipment_id: shipment_id.to_string(),
        cost_type,
        amount_original,
        currency: currency.to_string(),
        fx_rate_used,
        amount_base,
        volumetric_divisor: None,
        created_at: Utc::now(),
    }
}

fn base_cost(shipment_id: &str, cost_type: CostType, amount: Decimal) -> ShipmentCost {
    cost(shipment_id, cost_type, amount, "EUR", None, amount)
}

fn item(id: &str, consolidation_id: &str, quantity: i64, unit_price: Decimal) -> PurchaseItem {
    let now = Utc::now();
    PurchaseItem {
        id: id.to_string(),
        consolidation_id: Some(consolidation_id.to_string()),
        sku: None,
        name: format!("Item {id}"),
        quantity,
        unit_price: Some(unit_price),
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

fn carton(
    shipment_id: &str,
    item_id: &str,
    gross_weight_kg: Decimal,
    dims: (Decimal, Decimal, Decimal),
) -> ShipmentCarton {
    ShipmentCarton {
        id: Uuid::new_v4().to_string(),
        shipment_id: shipment_id.to_string(),
        purchase_item_id: item_id.to_string(),
        gross_weight_kg: Some(gross_weight_kg),
        length_cm: Some(dims.0),
        width_cm: Some(dims.1),
        height_cm: Some(dims.2),
        created_at: Utc::now(),
    }
}

/// Small dims so actual weight always dominates the chargeable weight.
const SMALL: (Decimal, Decimal, Decimal) = (dec!(10), dec!(10), dec!(10));

// =============================================================================
// Scenarios
// =============================================================================

/// One FREIGHT cost of 1000, two items with chargeable weights 30 and 70 kg,
/// quantity 1 each: allocations must be exactly 300 and 700.
#[tokio::test]
async fn freight_allocates_proportionally_to_chargeable_weight() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(1000))).await.unwrap();
    f.db.shipments().insert_item(&item("item-a", "con-1", 1, dec!(10))).await.unwrap();
    f.db.shipments().insert_item(&item("item-b", "con-1", 1, dec!(10))).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(30), SMALL)).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-b", dec!(70), SMALL)).await.unwrap();

    let breakdown = f.service.calculate_landing_costs("shp-1").await.unwrap();

    assert_eq!(breakdown.total_costs.freight, dec!(1000));
    let allocations = f.db.allocations().list_for_shipment("shp-1").await.unwrap();
    assert_eq!(allocations.len(), 2);

    let amount_for = |item_id: &str| {
        allocations
            .iter()
            .find(|a| a.purchase_item_id == item_id)
            .unwrap()
            .amount_allocated_base
    };
    assert_eq!(amount_for("item-a"), dec!(300));
    assert_eq!(amount_for("item-b"), dec!(700));
    assert!(allocations
        .iter()
        .all(|a| a.basis == AllocationBasis::ChargeableWeight));
}

/// FREIGHT 1000 split by weights 33.33 / 33.33 / 33.34: rounded shares
/// must sum exactly to 1000.
#[tokio::test]
async fn allocation_sum_matches_cost_exactly() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(1000))).await.unwrap();
    for (id, weight) in [("item-a", dec!(33.33)), ("item-b", dec!(33.33)), ("item-c", dec!(33.34))] {
        f.db.shipments().insert_item(&item(id, "con-1", 1, dec!(10))).await.unwrap();
        f.db.shipments().insert_carton(&carton("shp-1", id, weight, SMALL)).await.unwrap();
    }

    f.service.calculate_landing_costs("shp-1").await.unwrap();

    let allocations = f.db.allocations().list_for_shipment("shp-1").await.unwrap();
    let sum: Decimal = allocations.iter().map(|a| a.amount_allocated_base).sum();
    assert_eq!(sum, dec!(1000));
}

/// An item with no dimensions and no weight gets fallback estimates, and
/// the breakdown's warnings reference that item's id.
#[tokio::test]
async fn missing_physical_data_is_estimated_and_warned() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(100))).await.unwrap();
    // No cartons: items load via the consolidation, with no physical data.
    f.db.shipments().insert_item(&item("item-bare", "con-1", 2, dec!(10))).await.unwrap();

    let breakdown = f.service.calculate_landing_costs("shp-1").await.unwrap();

    assert!(breakdown.warnings.iter().any(|w| w.contains("item-bare")));
    let detail = &breakdown.item_breakdowns[0];
    assert!(detail.chargeable_weight > Decimal::ZERO);
    // Everything still allocates to the only item.
    assert_eq!(detail.unit_costs.freight * dec!(2), dec!(100));
}

/// A foreign-currency cost line with a zero FX rate: validation reports
/// an error naming the line, the calculation still succeeds using the
/// stored base amount and flags the conversion in warnings.
#[tokio::test]
async fn invalid_fx_rate_degrades_to_stored_base_amount() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    let bad_fx = cost(
        "shp-1",
        CostType::Freight,
        dec!(500),
        "USD",
        Some(dec!(0)),
        dec!(450),
    );
    f.db.shipments().insert_cost(&bad_fx).await.unwrap();
    f.db.shipments().insert_item(&item("item-a", "con-1", 1, dec!(10))).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(5), SMALL)).await.unwrap();

    let report = f.validator.validate("shp-1").await.unwrap();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains(&bad_fx.id)));

    let breakdown = f.service.calculate_landing_costs("shp-1").await.unwrap();
    assert!(breakdown
        .warnings
        .iter()
        .any(|w| w.contains(&bad_fx.id) && w.contains("FX")));
    // The stored base amount was allocated, not the original USD figure.
    assert_eq!(breakdown.total_costs.freight, dec!(450));
}

/// Duty: item with 10% duty rate and CIF of 50 per unit gives duty of 5
/// per unit, persisted as a DUTY allocation row of 5 × quantity, basis
/// VALUE.
#[tokio::test]
async fn duty_is_computed_from_cif_and_rate() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    // Per unit over qty 2: freight 8, insurance 2, product 40 → CIF 50.
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(16))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Insurance, dec!(4))).await.unwrap();
    let mut dutiable = item("item-a", "con-1", 2, dec!(40));
    dutiable.duty_rate_percent = Some(dec!(10));
    dutiable.hs_code = Some("8501.10".to_string());
    f.db.shipments().insert_item(&dutiable).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(5), SMALL)).await.unwrap();

    let breakdown = f.service.calculate_landing_costs("shp-1").await.unwrap();

    let detail = &breakdown.item_breakdowns[0];
    assert_eq!(detail.unit_costs.duty, dec!(5));
    assert_eq!(detail.unit_costs.total, dec!(55)); // 40 + 8 + 2 + 5
    assert_eq!(breakdown.total_costs.duty, dec!(10));

    let allocations = f.db.allocations().list_for_shipment("shp-1").await.unwrap();
    let duty_row = allocations
        .iter()
        .find(|a| a.cost_type == CostType::Duty)
        .unwrap();
    assert_eq!(duty_row.amount_allocated_base, dec!(10));
    assert_eq!(duty_row.basis, AllocationBasis::Value);
    assert_eq!(duty_row.details_json["hs_code"], "8501.10");
}

/// Insurance allocates by declared value; brokerage by unit count.
#[tokio::test]
async fn value_and_unit_bases_follow_cost_type() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Insurance, dec!(100))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Brokerage, dec!(50))).await.unwrap();
    // Values: 1×100 = 100 vs 3×100 = 300. Units: 1 vs 3.
    f.db.shipments().insert_item(&item("item-a", "con-1", 1, dec!(100))).await.unwrap();
    f.db.shipments().insert_item(&item("item-b", "con-1", 3, dec!(100))).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(1), SMALL)).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-b", dec!(3), SMALL)).await.unwrap();

    f.service.calculate_landing_costs("shp-1").await.unwrap();

    let allocations = f.db.allocations().list_for_shipment("shp-1").await.unwrap();
    let amount = |item_id: &str, cost_type: CostType| {
        allocations
            .iter()
            .find(|a| a.purchase_item_id == item_id && a.cost_type == cost_type)
            .unwrap()
            .amount_allocated_base
    };

    assert_eq!(amount("item-a", CostType::Insurance), dec!(25));
    assert_eq!(amount("item-b", CostType::Insurance), dec!(75));
    assert_eq!(amount("item-a", CostType::Brokerage), dec!(12.5));
    assert_eq!(amount("item-b", CostType::Brokerage), dec!(37.5));
}

/// Recalculating with unchanged inputs yields the same allocation facts
/// and the same per-unit landed costs.
#[tokio::test]
async fn recalculation_is_idempotent() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(1000))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Packaging, dec!(90))).await.unwrap();
    f.db.shipments().insert_item(&item("item-a", "con-1", 2, dec!(10))).await.unwrap();
    f.db.shipments().insert_item(&item("item-b", "con-1", 5, dec!(20))).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(30), SMALL)).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-b", dec!(70), SMALL)).await.unwrap();

    let first = f.service.calculate_landing_costs("shp-1").await.unwrap();
    let first_rows = allocation_facts(&f.db, "shp-1").await;

    let second = f.service.recalculate_landing_costs("shp-1").await.unwrap();
    let second_rows = allocation_facts(&f.db, "shp-1").await;

    assert_eq!(first_rows, second_rows);
    for (a, b) in first.item_breakdowns.iter().zip(&second.item_breakdowns) {
        assert_eq!(a.unit_costs.total, b.unit_costs.total);
    }
}

/// (item, cost type, basis, amount) tuples: ids and timestamps change on
/// every run, the allocation facts must not.
async fn allocation_facts(
    db: &Database,
    shipment_id: &str,
) -> Vec<(String, CostType, AllocationBasis, Decimal)> {
    let mut facts: Vec<_> = db
        .allocations()
        .list_for_shipment(shipment_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.purchase_item_id, a.cost_type, a.basis, a.amount_allocated_base))
        .collect();
    facts.sort_by(|a, b| (&a.0, a.1.as_str()).cmp(&(&b.0, b.1.as_str())));
    facts
}

// =============================================================================
// Persistence Side Effects
// =============================================================================

/// The per-unit landed cost is written back onto the purchase item and,
/// for SKU-matched products, appended to the cost history.
#[tokio::test]
async fn unit_cost_and_history_are_persisted() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(20))).await.unwrap();

    let product = Product {
        id: "prod-1".to_string(),
        sku: "SKU-1".to_string(),
        name: "Catalog widget".to_string(),
        created_at: Utc::now(),
    };
    f.db.products().insert(&product).await.unwrap();

    let mut it = item("item-a", "con-1", 2, dec!(10));
    it.sku = Some("SKU-1".to_string());
    f.db.shipments().insert_item(&it).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(4), SMALL)).await.unwrap();

    let breakdown = f.service.calculate_landing_costs("shp-1").await.unwrap();
    let expected_unit = dec!(20); // 10 product + 20/2 freight

    assert_eq!(breakdown.item_breakdowns[0].unit_costs.total, expected_unit);

    let history = f.db.products().history_for_product("prod-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].landing_cost_unit_base, expected_unit);
    assert_eq!(history[0].purchase_item_id, "item-a");

    // Recalculation appends, never overwrites.
    f.service.recalculate_landing_costs("shp-1").await.unwrap();
    let history = f.db.products().history_for_product("prod-1").await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn summary_reflects_persisted_allocations() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(100))).await.unwrap();
    f.db.shipments().insert_item(&item("item-a", "con-1", 1, dec!(10))).await.unwrap();
    f.db.shipments().insert_item(&item("item-b", "con-1", 1, dec!(10))).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-a", dec!(1), SMALL)).await.unwrap();
    f.db.shipments().insert_carton(&carton("shp-1", "item-b", dec!(3), SMALL)).await.unwrap();

    let before = f.service.get_landing_cost_summary("shp-1").await.unwrap();
    assert!(!before.has_allocations);
    assert_eq!(before.total_cost, Decimal::ZERO);
    assert!(before.last_calculated.is_none());

    f.service.calculate_landing_costs("shp-1").await.unwrap();

    let after = f.service.get_landing_cost_summary("shp-1").await.unwrap();
    assert!(after.has_allocations);
    assert_eq!(after.total_cost, dec!(100));
    assert_eq!(after.item_count, 2);
    assert!(after.last_calculated.is_some());
}

// =============================================================================
// Hard Failures
// =============================================================================

#[tokio::test]
async fn missing_shipment_is_a_typed_error() {
    let f = fixture().await;
    let err = f.service.calculate_landing_costs("ghost").await.unwrap_err();
    assert!(matches!(err, EngineError::ShipmentNotFound(id) if id == "ghost"));

    let err = f.service.get_landing_cost_summary("ghost").await.unwrap_err();
    assert!(matches!(err, EngineError::ShipmentNotFound(_)));
}

#[tokio::test]
async fn shipment_without_items_is_a_typed_error() {
    let f = fixture().await;
    f.db.shipments().insert_shipment(&shipment("shp-1", None)).await.unwrap();
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(100))).await.unwrap();

    let err = f.service.calculate_landing_costs("shp-1").await.unwrap_err();
    assert!(matches!(err, EngineError::NoItemsFound(_)));

    // Nothing was persisted.
    let allocations = f.db.allocations().list_for_shipment("shp-1").await.unwrap();
    assert!(allocations.is_empty());
}

#[tokio::test]
async fn validation_flags_missing_pieces_without_writing() {
    let f = fixture().await;

    let report = f.validator.validate("ghost").await.unwrap();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("ghost")));

    f.db.shipments().insert_shipment(&shipment("shp-1", Some("con-1"))).await.unwrap();
    let report = f.validator.validate("shp-1").await.unwrap();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("no cost lines")));
    assert!(report.errors.iter().any(|e| e.contains("no purchase items")));

    // Complete the data; warnings about estimates remain non-blocking.
    f.db.shipments().insert_cost(&base_cost("shp-1", CostType::Freight, dec!(100))).await.unwrap();
    f.db.shipments().insert_item(&item("item-a", "con-1", 1, dec!(10))).await.unwrap();
    let report = f.validator.validate("shp-1").await.unwrap();
    assert!(report.is_valid);
    assert!(!report.warnings.is_empty());
}
