//! Inventory read-model service
//!
//! Read-only stock views per branch and per item. All mutation goes through
//! the ledger service; these queries never write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{classify_stock_status, StockStatus};

/// Inventory view service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Stock of one item at a branch, with status classification
#[derive(Debug, Clone, Serialize)]
pub struct BranchStockEntry {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub category_name: String,
    pub current_stock: i32,
    pub reserved_stock: i32,
    pub available_stock: i32,
    pub minimum_stock_level: i32,
    pub stock_status: StockStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct BranchStockRow {
    item_id: Uuid,
    item_name: String,
    item_code: String,
    category_name: String,
    current_stock: i32,
    reserved_stock: i32,
    available_stock: i32,
    minimum_stock_level: i32,
    last_updated: Option<DateTime<Utc>>,
}

/// Stock of one item at one branch
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemStockEntry {
    pub item_name: String,
    pub item_code: String,
    pub branch_name: String,
    pub current_stock: i32,
    pub reserved_stock: i32,
    pub available_stock: i32,
}

/// Stock of one item across every active branch
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemStockAcrossBranches {
    pub item_name: String,
    pub item_code: String,
    pub branch_name: String,
    pub branch_code: String,
    pub current_stock: i32,
    pub available_stock: i32,
}

/// Item below its minimum stock level
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub available_stock: i32,
    pub minimum_stock_level: i32,
    pub shortage: i32,
}

/// Item with no available stock at a branch
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OutOfStockItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub minimum_stock_level: i32,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current stock for every active item at a branch. Items never stocked
    /// at the branch appear with zero balances.
    pub async fn branch_stock(&self, branch_id: Uuid) -> AppResult<Vec<BranchStockEntry>> {
        self.require_branch(branch_id).await?;

        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT i.id AS item_id, i.item_name, i.item_code, c.category_name,
                   COALESCE(inv.current_stock, 0) AS current_stock,
                   COALESCE(inv.reserved_stock, 0) AS reserved_stock,
                   COALESCE(inv.available_stock, 0) AS available_stock,
                   i.minimum_stock_level,
                   inv.last_updated
            FROM items i
            JOIN categories c ON i.category_id = c.id
            LEFT JOIN inventory inv ON i.id = inv.item_id AND inv.branch_id = $1
            WHERE i.is_active = TRUE
            ORDER BY i.item_name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BranchStockEntry {
                stock_status: classify_stock_status(r.available_stock, r.minimum_stock_level),
                item_id: r.item_id,
                item_name: r.item_name,
                item_code: r.item_code,
                category_name: r.category_name,
                current_stock: r.current_stock,
                reserved_stock: r.reserved_stock,
                available_stock: r.available_stock,
                minimum_stock_level: r.minimum_stock_level,
                last_updated: r.last_updated,
            })
            .collect())
    }

    /// Stock of a specific item at a specific branch
    pub async fn item_stock(&self, item_id: Uuid, branch_id: Uuid) -> AppResult<ItemStockEntry> {
        let entry = sqlx::query_as::<_, ItemStockEntry>(
            r#"
            SELECT i.item_name, i.item_code, b.branch_name,
                   COALESCE(inv.current_stock, 0) AS current_stock,
                   COALESCE(inv.reserved_stock, 0) AS reserved_stock,
                   COALESCE(inv.available_stock, 0) AS available_stock
            FROM items i
            CROSS JOIN branches b
            LEFT JOIN inventory inv ON i.id = inv.item_id AND b.id = inv.branch_id
            WHERE i.id = $1 AND b.id = $2
            "#,
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock record".to_string()))?;

        Ok(entry)
    }

    /// Stock of an item across all active branches
    pub async fn item_stock_across_branches(
        &self,
        item_id: Uuid,
    ) -> AppResult<Vec<ItemStockAcrossBranches>> {
        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let rows = sqlx::query_as::<_, ItemStockAcrossBranches>(
            r#"
            SELECT i.item_name, i.item_code, b.branch_name, b.branch_code,
                   COALESCE(inv.current_stock, 0) AS current_stock,
                   COALESCE(inv.available_stock, 0) AS available_stock
            FROM items i
            CROSS JOIN branches b
            LEFT JOIN inventory inv ON i.id = inv.item_id AND b.id = inv.branch_id
            WHERE i.id = $1 AND b.is_active = TRUE
            ORDER BY b.branch_name
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Active items at or below their minimum stock level, worst shortage
    /// first
    pub async fn low_stock(&self, branch_id: Uuid) -> AppResult<Vec<LowStockItem>> {
        self.require_branch(branch_id).await?;

        let rows = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT i.id AS item_id, i.item_name, i.item_code,
                   inv.available_stock, i.minimum_stock_level,
                   (i.minimum_stock_level - inv.available_stock) AS shortage
            FROM inventory inv
            JOIN items i ON inv.item_id = i.id
            WHERE inv.branch_id = $1
              AND inv.available_stock <= i.minimum_stock_level
              AND i.is_active = TRUE
            ORDER BY shortage DESC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Active items with no available stock at a branch
    pub async fn out_of_stock(&self, branch_id: Uuid) -> AppResult<Vec<OutOfStockItem>> {
        self.require_branch(branch_id).await?;

        let rows = sqlx::query_as::<_, OutOfStockItem>(
            r#"
            SELECT i.id AS item_id, i.item_name, i.item_code, i.minimum_stock_level
            FROM items i
            LEFT JOIN inventory inv ON i.id = inv.item_id AND inv.branch_id = $1
            WHERE (inv.available_stock IS NULL OR inv.available_stock <= 0)
              AND i.is_active = TRUE
            ORDER BY i.item_name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn require_branch(&self, branch_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(branch_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Branch".to_string()));
        }
        Ok(())
    }
}
