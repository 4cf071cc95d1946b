//! # Product Repository
//!
//! Database operations for catalog products and their landed cost history.
//!
//! Purchase items carry an optional SKU; when a calculation finishes, each
//! SKU that matches a catalog product gets an append-only history entry
//! recording the per-unit landed cost. Items without a SKU (or with an
//! unmatched SKU) are skipped silently - history is best-effort.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use landed_core::{Product, ProductCostHistoryEntry};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: String,
    product_id: String,
    purchase_item_id: String,
    landing_cost_unit_base: String,
    method: String,
    computed_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for ProductCostHistoryEntry {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> DbResult<Self> {
        Ok(ProductCostHistoryEntry {
            id: row.id,
            product_id: row.product_id,
            purchase_item_id: row.purchase_item_id,
            landing_cost_unit_base: parse_decimal(
                "landing_cost_unit_base",
                &row.landing_cost_unit_base,
            )?,
            method: row.method,
            computed_at: row.computed_at,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Finds a product by SKU.
    pub async fn find_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_sku_with(&mut conn, sku).await
    }

    /// Finds a product by SKU on an explicit connection (transactional use).
    pub async fn find_by_sku_with(
        conn: &mut SqliteConnection,
        sku: &str,
    ) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, sku, name, created_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a product (used by ingestion, seeding, and tests).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends a cost history entry on an explicit connection.
    pub async fn append_cost_history_with(
        conn: &mut SqliteConnection,
        entry: &ProductCostHistoryEntry,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_cost_history (
                id, product_id, purchase_item_id,
                landing_cost_unit_base, method, computed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.product_id)
        .bind(&entry.purchase_item_id)
        .bind(entry.landing_cost_unit_base.to_string())
        .bind(&entry.method)
        .bind(entry.computed_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Gets all cost history entries for a product, newest first.
    pub async fn history_for_product(
        &self,
        product_id: &str,
    ) -> DbResult<Vec<ProductCostHistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, purchase_item_id,
                   landing_cost_unit_base, method, computed_at
            FROM product_cost_history
            WHERE product_id = ?1
            ORDER BY computed_at DESC, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(ProductCostHistoryEntry::try_from)
            .collect()
    }
}
