//! # Allocation Repository
//!
//! Database operations for persisted cost allocations.
//!
//! ## Replace-Wholesale Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every recalculation:                                                   │
//! │                                                                         │
//! │    DELETE FROM cost_allocations WHERE shipment_id = ?                   │
//! │    INSERT ... (one row per item × cost type)                            │
//! │                                                                         │
//! │  Both statements run inside the engine's transaction, so readers        │
//! │  never observe a shipment with half its allocations, and running        │
//! │  the calculation twice yields the same rows.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use landed_core::{AllocationBasis, CostAllocation, CostType, LandingCostSummary};

#[derive(Debug, FromRow)]
struct AllocationRow {
    id: String,
    shipment_id: String,
    purchase_item_id: String,
    cost_type: String,
    basis: String,
    amount_allocated_base: String,
    details_json: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AllocationRow> for CostAllocation {
    type Error = DbError;

    fn try_from(row: AllocationRow) -> DbResult<Self> {
        let cost_type: CostType = row
            .cost_type
            .parse()
            .map_err(|e: String| DbError::decode("cost_type", e))?;
        let basis: AllocationBasis = row
            .basis
            .parse()
            .map_err(|e: String| DbError::decode("basis", e))?;
        let details_json: serde_json::Value = serde_json::from_str(&row.details_json)
            .map_err(|e| DbError::decode("details_json", e.to_string()))?;

        Ok(CostAllocation {
            id: row.id,
            shipment_id: row.shipment_id,
            purchase_item_id: row.purchase_item_id,
            cost_type,
            basis,
            amount_allocated_base: parse_decimal(
                "amount_allocated_base",
                &row.amount_allocated_base,
            )?,
            details_json,
            created_at: row.created_at,
        })
    }
}

/// Repository for cost allocation operations.
#[derive(Debug, Clone)]
pub struct AllocationRepository {
    pool: SqlitePool,
}

impl AllocationRepository {
    /// Creates a new AllocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AllocationRepository { pool }
    }

    /// Replaces all allocations for a shipment with a fresh set.
    ///
    /// Must run on the engine's transaction connection so the
    /// delete-then-insert pair is atomic with the rest of the
    /// recalculation.
    pub async fn replace_for_shipment_with(
        conn: &mut SqliteConnection,
        shipment_id: &str,
        allocations: &[CostAllocation],
    ) -> DbResult<()> {
        debug!(
            shipment_id = %shipment_id,
            count = allocations.len(),
            "Replacing cost allocations"
        );

        sqlx::query("DELETE FROM cost_allocations WHERE shipment_id = ?1")
            .bind(shipment_id)
            .execute(&mut *conn)
            .await?;

        for allocation in allocations {
            sqlx::query(
                r#"
                INSERT INTO cost_allocations (
                    id, shipment_id, purchase_item_id, cost_type, basis,
                    amount_allocated_base, details_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&allocation.id)
            .bind(&allocation.shipment_id)
            .bind(&allocation.purchase_item_id)
            .bind(allocation.cost_type.as_str())
            .bind(allocation.basis.as_str())
            .bind(allocation.amount_allocated_base.to_string())
            .bind(allocation.details_json.to_string())
            .bind(allocation.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Lists all persisted allocations for a shipment.
    pub async fn list_for_shipment(&self, shipment_id: &str) -> DbResult<Vec<CostAllocation>> {
        let rows: Vec<AllocationRow> = sqlx::query_as(
            r#"
            SELECT id, shipment_id, purchase_item_id, cost_type, basis,
                   amount_allocated_base, details_json, created_at
            FROM cost_allocations
            WHERE shipment_id = ?1
            ORDER BY purchase_item_id, cost_type
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CostAllocation::try_from).collect()
    }

    /// Builds a read-only summary over persisted allocations.
    ///
    /// Totals are folded in Rust rather than SQL SUM: the amount column
    /// is a decimal TEXT literal, and summing it in SQLite would go
    /// through floating point.
    pub async fn summary_for_shipment(&self, shipment_id: &str) -> DbResult<LandingCostSummary> {
        let allocations = self.list_for_shipment(shipment_id).await?;

        let total_cost: Decimal = allocations.iter().map(|a| a.amount_allocated_base).sum();
        let item_count = {
            let mut ids: Vec<&str> = allocations
                .iter()
                .map(|a| a.purchase_item_id.as_str())
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids.len()
        };
        let last_calculated = allocations.iter().map(|a| a.created_at).max();

        Ok(LandingCostSummary {
            shipment_id: shipment_id.to_string(),
            total_cost,
            item_count,
            last_calculated,
            has_allocations: !allocations.is_empty(),
        })
    }
}
