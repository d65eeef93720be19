//! Item catalog management service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::validation::{validate_item_code, validate_stock_thresholds};

/// Item service for the stockable product catalog
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// An item record with its category name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub minimum_stock_level: i32,
    pub maximum_stock_level: i32,
    pub unit_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub item_name: String,
    pub item_code: String,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub minimum_stock_level: Option<i32>,
    pub maximum_stock_level: Option<i32>,
    pub unit_price: Option<Decimal>,
}

/// Input for updating an item. Identity (id, code) is immutable once
/// created; thresholds and price may change over time.
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub item_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub minimum_stock_level: Option<i32>,
    pub maximum_stock_level: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Input for a category-wide minimum stock update
#[derive(Debug, Deserialize)]
pub struct BatchMinStockInput {
    pub category_id: Uuid,
    pub minimum_stock_level: i32,
}

/// Input for a category-wide percentage price change
#[derive(Debug, Deserialize)]
pub struct BatchPriceInput {
    pub category_id: Uuid,
    pub percentage_change: Decimal,
}

/// One item touched by a batch update
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BatchUpdatedItem {
    pub item_id: Uuid,
    pub item_name: String,
}

/// Result of a batch update
#[derive(Debug, Serialize)]
pub struct BatchUpdateResult {
    pub affected_rows: u64,
    pub updated_items: Vec<BatchUpdatedItem>,
}

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.item_name, i.item_code, i.category_id, c.category_name,
           i.description, i.unit_of_measure, i.minimum_stock_level,
           i.maximum_stock_level, i.unit_price, i.is_active,
           i.created_at, i.updated_at
    FROM items i
    JOIN categories c ON i.category_id = c.id
"#;

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List items, active first
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<ItemRecord>> {
        let query = format!(
            "{} WHERE i.is_active = TRUE OR $1 ORDER BY i.is_active DESC, i.item_name",
            ITEM_SELECT
        );
        let items = sqlx::query_as::<_, ItemRecord>(&query)
            .bind(include_inactive)
            .fetch_all(&self.db)
            .await?;
        Ok(items)
    }

    /// Active items in one category
    pub async fn by_category(&self, category_id: Uuid) -> AppResult<Vec<ItemRecord>> {
        let query = format!(
            "{} WHERE i.category_id = $1 AND i.is_active = TRUE ORDER BY i.item_name",
            ITEM_SELECT
        );
        let items = sqlx::query_as::<_, ItemRecord>(&query)
            .bind(category_id)
            .fetch_all(&self.db)
            .await?;
        Ok(items)
    }

    /// Get an item by id
    pub async fn get(&self, item_id: Uuid) -> AppResult<ItemRecord> {
        let query = format!("{} WHERE i.id = $1", ITEM_SELECT);
        sqlx::query_as::<_, ItemRecord>(&query)
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Create an item
    pub async fn create(&self, input: CreateItemInput) -> AppResult<ItemRecord> {
        if input.item_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "item_name".to_string(),
                message: "Item name cannot be empty".to_string(),
            });
        }
        if let Err(msg) = validate_item_code(&input.item_code) {
            return Err(AppError::Validation {
                field: "item_code".to_string(),
                message: msg.to_string(),
            });
        }

        let minimum = input.minimum_stock_level.unwrap_or(0);
        let maximum = input.maximum_stock_level.unwrap_or(1000);
        if let Err(msg) = validate_stock_thresholds(minimum, maximum) {
            return Err(AppError::Validation {
                field: "minimum_stock_level".to_string(),
                message: msg.to_string(),
            });
        }

        let unit_price = input.unit_price.unwrap_or(Decimal::ZERO);
        if unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
            });
        }

        let category_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(input.category_id)
                .fetch_one(&self.db)
                .await?;
        if !category_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO items
                (item_name, item_code, category_id, description, unit_of_measure,
                 minimum_stock_level, maximum_stock_level, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&input.item_name)
        .bind(&input.item_code)
        .bind(input.category_id)
        .bind(&input.description)
        .bind(input.unit_of_measure.as_deref().unwrap_or("PCS"))
        .bind(minimum)
        .bind(maximum)
        .bind(unit_price)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("item_code".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        self.get(item_id).await
    }

    /// Update an item; absent fields are left unchanged
    pub async fn update(&self, item_id: Uuid, input: UpdateItemInput) -> AppResult<ItemRecord> {
        let existing = self.get(item_id).await?;

        let item_name = input.item_name.unwrap_or(existing.item_name);
        if item_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "item_name".to_string(),
                message: "Item name cannot be empty".to_string(),
            });
        }
        let category_id = input.category_id.unwrap_or(existing.category_id);
        let description = input.description.or(existing.description);
        let unit_of_measure = input.unit_of_measure.unwrap_or(existing.unit_of_measure);
        let minimum = input
            .minimum_stock_level
            .unwrap_or(existing.minimum_stock_level);
        let maximum = input
            .maximum_stock_level
            .unwrap_or(existing.maximum_stock_level);
        if let Err(msg) = validate_stock_thresholds(minimum, maximum) {
            return Err(AppError::Validation {
                field: "minimum_stock_level".to_string(),
                message: msg.to_string(),
            });
        }
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        if unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
            });
        }
        let is_active = input.is_active.unwrap_or(existing.is_active);

        if category_id != existing.category_id {
            let category_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
            )
            .bind(category_id)
            .fetch_one(&self.db)
            .await?;
            if !category_exists {
                return Err(AppError::NotFound("Category".to_string()));
            }
        }

        sqlx::query(
            r#"
            UPDATE items
            SET item_name = $2, category_id = $3, description = $4, unit_of_measure = $5,
                minimum_stock_level = $6, maximum_stock_level = $7, unit_price = $8,
                is_active = $9, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(&item_name)
        .bind(category_id)
        .bind(&description)
        .bind(&unit_of_measure)
        .bind(minimum)
        .bind(maximum)
        .bind(unit_price)
        .bind(is_active)
        .execute(&self.db)
        .await?;

        self.get(item_id).await
    }

    /// Deactivate an item. Items are never hard-deleted while movement
    /// history references them.
    pub async fn deactivate(&self, item_id: Uuid) -> AppResult<ItemRecord> {
        let result =
            sqlx::query("UPDATE items SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(item_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        self.get(item_id).await
    }

    /// Set the minimum stock level for every item in a category
    pub async fn batch_update_min_stock(
        &self,
        input: BatchMinStockInput,
    ) -> AppResult<BatchUpdateResult> {
        if input.minimum_stock_level < 0 {
            return Err(AppError::Validation {
                field: "minimum_stock_level".to_string(),
                message: "Minimum stock level cannot be negative".to_string(),
            });
        }

        let updated = sqlx::query_as::<_, BatchUpdatedItem>(
            r#"
            UPDATE items
            SET minimum_stock_level = $2, updated_at = NOW()
            WHERE category_id = $1
            RETURNING id AS item_id, item_name
            "#,
        )
        .bind(input.category_id)
        .bind(input.minimum_stock_level)
        .fetch_all(&self.db)
        .await?;

        Ok(BatchUpdateResult {
            affected_rows: updated.len() as u64,
            updated_items: updated,
        })
    }

    /// Apply a percentage price change to every item in a category
    pub async fn batch_update_prices(&self, input: BatchPriceInput) -> AppResult<BatchUpdateResult> {
        if input.percentage_change <= Decimal::from(-100) {
            return Err(AppError::Validation {
                field: "percentage_change".to_string(),
                message: "Price change would make prices non-positive".to_string(),
            });
        }

        let updated = sqlx::query_as::<_, BatchUpdatedItem>(
            r#"
            UPDATE items
            SET unit_price = ROUND(unit_price * (1 + $2 / 100), 2), updated_at = NOW()
            WHERE category_id = $1
            RETURNING id AS item_id, item_name
            "#,
        )
        .bind(input.category_id)
        .bind(input.percentage_change)
        .fetch_all(&self.db)
        .await?;

        Ok(BatchUpdateResult {
            affected_rows: updated.len() as u64,
            updated_items: updated,
        })
    }
}
