//! # Shipment Repository
//!
//! Database operations for shipments, their cost lines, cartons, and the
//! purchase items linked to them.
//!
//! ## Item Sourcing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Which purchase items belong to a shipment?                 │
//! │                                                                         │
//! │  1. CARTON LINK (preferred)                                             │
//! │     shipment_cartons.purchase_item_id → purchase_items.id               │
//! │     Physical packing data exists; weights come from measured cartons.   │
//! │                                                                         │
//! │  2. CONSOLIDATION LINK (fallback)                                       │
//! │     shipments.consolidation_id = purchase_items.consolidation_id        │
//! │     No cartons recorded yet; weights fall back to item estimates.       │
//! │                                                                         │
//! │  The engine tries 1, then 2, and errors only when both are empty.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{parse_decimal, parse_opt_decimal};
use landed_core::{
    CostType, PurchaseItem, Shipment, ShipmentCarton, ShipmentCost, ShippingMode,
};

// =============================================================================
// Row Types
// =============================================================================
//
// Decimal and enum columns arrive as TEXT; these row structs hold the raw
// strings and TryFrom converts them into domain types, so parsing failures
// carry the column name.

#[derive(Debug, FromRow)]
struct ShipmentRow {
    id: String,
    shipment_number: String,
    consolidation_id: Option<String>,
    shipping_mode: String,
    carrier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShipmentRow> for Shipment {
    type Error = DbError;

    fn try_from(row: ShipmentRow) -> DbResult<Self> {
        let shipping_mode: ShippingMode = row
            .shipping_mode
            .parse()
            .map_err(|e: String| DbError::decode("shipping_mode", e))?;
        Ok(Shipment {
            id: row.id,
            shipment_number: row.shipment_number,
            consolidation_id: row.consolidation_id,
            shipping_mode,
            carrier: row.carrier,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CostRow {
    id: String,
    shipment_id: String,
    cost_type: String,
    amount_original: String,
    currency: String,
    fx_rate_used: Option<String>,
    amount_base: String,
    volumetric_divisor: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CostRow> for ShipmentCost {
    type Error = DbError;

    fn try_from(row: CostRow) -> DbResult<Self> {
        let cost_type: CostType = row
            .cost_type
            .parse()
            .map_err(|e: String| DbError::decode("cost_type", e))?;
        Ok(ShipmentCost {
            id: row.id,
            shipment_id: row.shipment_id,
            cost_type,
            amount_original: parse_decimal("amount_original", &row.amount_original)?,
            currency: row.currency,
            fx_rate_used: parse_opt_decimal("fx_rate_used", row.fx_rate_used.as_deref())?,
            amount_base: parse_decimal("amount_base", &row.amount_base)?,
            volumetric_divisor: parse_opt_decimal(
                "volumetric_divisor",
                row.volumetric_divisor.as_deref(),
            )?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CartonRow {
    id: String,
    shipment_id: String,
    purchase_item_id: String,
    gross_weight_kg: Option<String>,
    length_cm: Option<String>,
    width_cm: Option<String>,
    height_cm: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartonRow> for ShipmentCarton {
    type Error = DbError;

    fn try_from(row: CartonRow) -> DbResult<Self> {
        Ok(ShipmentCarton {
            id: row.id,
            shipment_id: row.shipment_id,
            purchase_item_id: row.purchase_item_id,
            gross_weight_kg: parse_opt_decimal("gross_weight_kg", row.gross_weight_kg.as_deref())?,
            length_cm: parse_opt_decimal("length_cm", row.length_cm.as_deref())?,
            width_cm: parse_opt_decimal("width_cm", row.width_cm.as_deref())?,
            height_cm: parse_opt_decimal("height_cm", row.height_cm.as_deref())?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    consolidation_id: Option<String>,
    sku: Option<String>,
    name: String,
    quantity: i64,
    unit_price: Option<String>,
    total_price: Option<String>,
    weight_kg: Option<String>,
    length_cm: Option<String>,
    width_cm: Option<String>,
    height_cm: Option<String>,
    duty_rate_percent: Option<String>,
    hs_code: Option<String>,
    landing_cost_unit_base: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for PurchaseItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(PurchaseItem {
            id: row.id,
            consolidation_id: row.consolidation_id,
            sku: row.sku,
            name: row.name,
            quantity: row.quantity,
            unit_price: parse_opt_decimal("unit_price", row.unit_price.as_deref())?,
            total_price: parse_opt_decimal("total_price", row.total_price.as_deref())?,
            weight_kg: parse_opt_decimal("weight_kg", row.weight_kg.as_deref())?,
            length_cm: parse_opt_decimal("length_cm", row.length_cm.as_deref())?,
            width_cm: parse_opt_decimal("width_cm", row.width_cm.as_deref())?,
            height_cm: parse_opt_decimal("height_cm", row.height_cm.as_deref())?,
            duty_rate_percent: parse_opt_decimal(
                "duty_rate_percent",
                row.duty_rate_percent.as_deref(),
            )?,
            hs_code: row.hs_code,
            landing_cost_unit_base: parse_opt_decimal(
                "landing_cost_unit_base",
                row.landing_cost_unit_base.as_deref(),
            )?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shipment database operations.
#[derive(Debug, Clone)]
pub struct ShipmentRepository {
    pool: SqlitePool,
}

impl ShipmentRepository {
    /// Creates a new ShipmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShipmentRepository { pool }
    }

    /// Gets a shipment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_with(&mut conn, id).await
    }

    /// Gets a shipment by ID on an explicit connection (transactional use).
    pub async fn get_by_id_with(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Shipment>> {
        let row: Option<ShipmentRow> = sqlx::query_as(
            r#"
            SELECT id, shipment_number, consolidation_id, shipping_mode,
                   carrier, created_at, updated_at
            FROM shipments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Shipment::try_from).transpose()
    }

    /// Gets all cost lines for a shipment, oldest first.
    pub async fn costs_for_shipment_with(
        conn: &mut SqliteConnection,
        shipment_id: &str,
    ) -> DbResult<Vec<ShipmentCost>> {
        let rows: Vec<CostRow> = sqlx::query_as(
            r#"
            SELECT id, shipment_id, cost_type, amount_original, currency,
                   fx_rate_used, amount_base, volumetric_divisor, created_at
            FROM shipment_costs
            WHERE shipment_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(shipment_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(ShipmentCost::try_from).collect()
    }

    /// Gets all cartons for a shipment.
    pub async fn cartons_for_shipment_with(
        conn: &mut SqliteConnection,
        shipment_id: &str,
    ) -> DbResult<Vec<ShipmentCarton>> {
        let rows: Vec<CartonRow> = sqlx::query_as(
            r#"
            SELECT id, shipment_id, purchase_item_id, gross_weight_kg,
                   length_cm, width_cm, height_cm, created_at
            FROM shipment_cartons
            WHERE shipment_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(shipment_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(ShipmentCarton::try_from).collect()
    }

    /// Gets purchase items linked to a shipment through its cartons.
    pub async fn items_via_cartons_with(
        conn: &mut SqliteConnection,
        shipment_id: &str,
    ) -> DbResult<Vec<PurchaseItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT
                   pi.id, pi.consolidation_id, pi.sku, pi.name, pi.quantity,
                   pi.unit_price, pi.total_price, pi.weight_kg,
                   pi.length_cm, pi.width_cm, pi.height_cm,
                   pi.duty_rate_percent, pi.hs_code, pi.landing_cost_unit_base,
                   pi.created_at, pi.updated_at
            FROM purchase_items pi
            JOIN shipment_cartons sc ON sc.purchase_item_id = pi.id
            WHERE sc.shipment_id = ?1
            ORDER BY pi.created_at, pi.id
            "#,
        )
        .bind(shipment_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(PurchaseItem::try_from).collect()
    }

    /// Gets purchase items sharing the shipment's consolidation.
    pub async fn items_via_consolidation_with(
        conn: &mut SqliteConnection,
        consolidation_id: &str,
    ) -> DbResult<Vec<PurchaseItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, consolidation_id, sku, name, quantity,
                   unit_price, total_price, weight_kg,
                   length_cm, width_cm, height_cm,
                   duty_rate_percent, hs_code, landing_cost_unit_base,
                   created_at, updated_at
            FROM purchase_items
            WHERE consolidation_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(consolidation_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(PurchaseItem::try_from).collect()
    }

    /// Writes the computed per-unit landed cost back onto an item.
    pub async fn update_landing_cost_with(
        conn: &mut SqliteConnection,
        item_id: &str,
        unit_cost: rust_decimal::Decimal,
    ) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE purchase_items SET
                landing_cost_unit_base = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(unit_cost.to_string())
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PurchaseItem", item_id));
        }

        Ok(())
    }

    /// Inserts a shipment (used by ingestion, seeding, and tests).
    pub async fn insert_shipment(&self, shipment: &Shipment) -> DbResult<()> {
        debug!(id = %shipment.id, number = %shipment.shipment_number, "Inserting shipment");

        sqlx::query(
            r#"
            INSERT INTO shipments (
                id, shipment_number, consolidation_id, shipping_mode,
                carrier, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&shipment.id)
        .bind(&shipment.shipment_number)
        .bind(&shipment.consolidation_id)
        .bind(shipment.shipping_mode.as_str())
        .bind(&shipment.carrier)
        .bind(shipment.created_at)
        .bind(shipment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a cost line.
    pub async fn insert_cost(&self, cost: &ShipmentCost) -> DbResult<()> {
        debug!(
            shipment_id = %cost.shipment_id,
            cost_type = %cost.cost_type,
            "Inserting shipment cost"
        );

        sqlx::query(
            r#"
            INSERT INTO shipment_costs (
                id, shipment_id, cost_type, amount_original, currency,
                fx_rate_used, amount_base, volumetric_divisor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&cost.id)
        .bind(&cost.shipment_id)
        .bind(cost.cost_type.as_str())
        .bind(cost.amount_original.to_string())
        .bind(&cost.currency)
        .bind(cost.fx_rate_used.map(|d| d.to_string()))
        .bind(cost.amount_base.to_string())
        .bind(cost.volumetric_divisor.map(|d| d.to_string()))
        .bind(cost.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a carton.
    pub async fn insert_carton(&self, carton: &ShipmentCarton) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shipment_cartons (
                id, shipment_id, purchase_item_id, gross_weight_kg,
                length_cm, width_cm, height_cm, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&carton.id)
        .bind(&carton.shipment_id)
        .bind(&carton.purchase_item_id)
        .bind(carton.gross_weight_kg.map(|d| d.to_string()))
        .bind(carton.length_cm.map(|d| d.to_string()))
        .bind(carton.width_cm.map(|d| d.to_string()))
        .bind(carton.height_cm.map(|d| d.to_string()))
        .bind(carton.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a purchase item.
    pub async fn insert_item(&self, item: &PurchaseItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting purchase item");

        sqlx::query(
            r#"
            INSERT INTO purchase_items (
                id, consolidation_id, sku, name, quantity,
                unit_price, total_price, weight_kg,
                length_cm, width_cm, height_cm,
                duty_rate_percent, hs_code, landing_cost_unit_base,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.consolidation_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price.map(|d| d.to_string()))
        .bind(item.total_price.map(|d| d.to_string()))
        .bind(item.weight_kg.map(|d| d.to_string()))
        .bind(item.length_cm.map(|d| d.to_string()))
        .bind(item.width_cm.map(|d| d.to_string()))
        .bind(item.height_cm.map(|d| d.to_string()))
        .bind(item.duty_rate_percent.map(|d| d.to_string()))
        .bind(&item.hs_code)
        .bind(item.landing_cost_unit_base.map(|d| d.to_string()))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
