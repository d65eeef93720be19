//! Stock movement query service
//!
//! Read-only access to the append-only movement log. Posting goes through
//! the ledger service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{MovementType, ReferenceType};
use shared::types::Pagination;

/// Movement query service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// A stock movement with joined display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for movement listings
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub item_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub reference_type: Option<ReferenceType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

const MOVEMENT_SELECT: &str = r#"
    SELECT sm.id, sm.item_id, i.item_name, sm.branch_id, b.branch_name,
           sm.movement_type, sm.quantity, sm.previous_stock, sm.new_stock,
           sm.reference_type, sm.reference_id, sm.notes,
           sm.created_by, u.full_name AS created_by_name, sm.created_at
    FROM stock_movements sm
    JOIN items i ON sm.item_id = i.id
    JOIN branches b ON sm.branch_id = b.id
    JOIN users u ON sm.created_by = u.id
"#;

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a movement by id
    pub async fn get(&self, movement_id: Uuid) -> AppResult<MovementView> {
        let query = format!("{} WHERE sm.id = $1", MOVEMENT_SELECT);
        sqlx::query_as::<_, MovementView>(&query)
            .bind(movement_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))
    }

    /// List movements matching the filter, newest first
    pub async fn list(
        &self,
        filter: MovementFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<MovementView>> {
        let pagination = pagination.clamped();
        let query = format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR sm.item_id = $1)
              AND ($2::uuid IS NULL OR sm.branch_id = $2)
              AND ($3::varchar IS NULL OR sm.movement_type = $3)
              AND ($4::varchar IS NULL OR sm.reference_type = $4)
              AND ($5::timestamptz IS NULL OR sm.created_at >= $5)
              AND ($6::timestamptz IS NULL OR sm.created_at <= $6)
            ORDER BY sm.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
            MOVEMENT_SELECT
        );

        let movements = sqlx::query_as::<_, MovementView>(&query)
            .bind(filter.item_id)
            .bind(filter.branch_id)
            .bind(filter.movement_type.map(|t| t.as_str()))
            .bind(filter.reference_type.map(|t| t.as_str()))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db)
            .await?;

        Ok(movements)
    }

    /// Full movement history of an item across branches, newest first
    pub async fn for_item(&self, item_id: Uuid) -> AppResult<Vec<MovementView>> {
        let query = format!(
            "{} WHERE sm.item_id = $1 ORDER BY sm.created_at DESC",
            MOVEMENT_SELECT
        );
        let movements = sqlx::query_as::<_, MovementView>(&query)
            .bind(item_id)
            .fetch_all(&self.db)
            .await?;
        Ok(movements)
    }

    /// Full movement history of a branch, newest first
    pub async fn for_branch(&self, branch_id: Uuid) -> AppResult<Vec<MovementView>> {
        let query = format!(
            "{} WHERE sm.branch_id = $1 ORDER BY sm.created_at DESC",
            MOVEMENT_SELECT
        );
        let movements = sqlx::query_as::<_, MovementView>(&query)
            .bind(branch_id)
            .fetch_all(&self.db)
            .await?;
        Ok(movements)
    }
}
