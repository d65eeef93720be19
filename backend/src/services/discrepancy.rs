//! Stock discrepancy workflow service
//!
//! Physical counts that disagree with the ledger are reported here, moved
//! through investigation, and resolved. Resolution can apply the corrective
//! adjustment in the same transaction so the ledger converges on physical
//! reality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::models::{stock_difference, DiscrepancyStatus, DiscrepancyType, ReferenceType};

/// Discrepancy service
#[derive(Clone)]
pub struct DiscrepancyService {
    db: PgPool,
}

/// A reported discrepancy with joined display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DiscrepancyRecord {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_code: String,
    pub expected_stock: i32,
    pub actual_stock: i32,
    pub difference: i32,
    pub discrepancy_type: String,
    pub status: String,
    pub investigation_notes: Option<String>,
    pub resolution_notes: Option<String>,
    pub reported_by: Uuid,
    pub reported_by_name: String,
    pub reported_date: DateTime<Utc>,
    pub resolved_date: Option<DateTime<Utc>>,
}

/// Input for reporting a discrepancy
#[derive(Debug, Deserialize)]
pub struct ReportDiscrepancyInput {
    pub branch_id: Uuid,
    pub item_id: Uuid,
    pub expected_stock: i32,
    pub actual_stock: i32,
    #[serde(default)]
    pub discrepancy_type: DiscrepancyType,
    pub investigation_notes: Option<String>,
}

/// Input for updating an investigation
#[derive(Debug, Deserialize)]
pub struct InvestigateInput {
    pub investigation_notes: Option<String>,
    pub status: Option<DiscrepancyStatus>,
}

/// Input for resolving a discrepancy
#[derive(Debug, Deserialize)]
pub struct ResolveDiscrepancyInput {
    pub resolution_notes: String,
    /// Post the corrective ADJUSTMENT bringing the ledger to the counted
    /// stock. On by default.
    #[serde(default = "default_apply_adjustment")]
    pub apply_adjustment: bool,
}

fn default_apply_adjustment() -> bool {
    true
}

const DISCREPANCY_SELECT: &str = r#"
    SELECT sd.id, sd.branch_id, b.branch_name, sd.item_id, i.item_name, i.item_code,
           sd.expected_stock, sd.actual_stock, sd.difference, sd.discrepancy_type,
           sd.status, sd.investigation_notes, sd.resolution_notes,
           sd.reported_by, u.full_name AS reported_by_name,
           sd.reported_date, sd.resolved_date
    FROM stock_discrepancies sd
    JOIN branches b ON sd.branch_id = b.id
    JOIN items i ON sd.item_id = i.id
    JOIN users u ON sd.reported_by = u.id
"#;

impl DiscrepancyService {
    /// Create a new DiscrepancyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Report a discrepancy between counted and expected stock. Pure record
    /// creation, no ledger effect yet.
    pub async fn report(
        &self,
        reported_by: Uuid,
        input: ReportDiscrepancyInput,
    ) -> AppResult<DiscrepancyRecord> {
        if input.expected_stock < 0 || input.actual_stock < 0 {
            return Err(AppError::InvalidQuantity(
                "Stock counts cannot be negative".to_string(),
            ));
        }

        let branch_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(input.branch_id)
                .fetch_one(&self.db)
                .await?;
        if !branch_exists {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(input.item_id)
                .fetch_one(&self.db)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let difference = stock_difference(input.actual_stock, input.expected_stock);

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_discrepancies
                (branch_id, item_id, expected_stock, actual_stock, difference,
                 discrepancy_type, status, investigation_notes, reported_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'REPORTED', $7, $8)
            RETURNING id
            "#,
        )
        .bind(input.branch_id)
        .bind(input.item_id)
        .bind(input.expected_stock)
        .bind(input.actual_stock)
        .bind(difference)
        .bind(input.discrepancy_type.as_str())
        .bind(&input.investigation_notes)
        .bind(reported_by)
        .fetch_one(&self.db)
        .await?;

        self.get(id).await
    }

    /// Get a discrepancy by id
    pub async fn get(&self, discrepancy_id: Uuid) -> AppResult<DiscrepancyRecord> {
        let query = format!("{} WHERE sd.id = $1", DISCREPANCY_SELECT);
        sqlx::query_as::<_, DiscrepancyRecord>(&query)
            .bind(discrepancy_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Discrepancy".to_string()))
    }

    /// List all discrepancies, newest first
    pub async fn list(&self) -> AppResult<Vec<DiscrepancyRecord>> {
        let query = format!("{} ORDER BY sd.reported_date DESC", DISCREPANCY_SELECT);
        let records = sqlx::query_as::<_, DiscrepancyRecord>(&query)
            .fetch_all(&self.db)
            .await?;
        Ok(records)
    }

    /// Unresolved reports, largest absolute difference first
    pub async fn pending(&self) -> AppResult<Vec<DiscrepancyRecord>> {
        let query = format!(
            "{} WHERE sd.status = 'REPORTED' ORDER BY ABS(sd.difference) DESC",
            DISCREPANCY_SELECT
        );
        let records = sqlx::query_as::<_, DiscrepancyRecord>(&query)
            .fetch_all(&self.db)
            .await?;
        Ok(records)
    }

    /// Update investigation notes and/or move REPORTED -> INVESTIGATING.
    /// Resolution goes through `resolve`, not here.
    pub async fn investigate(
        &self,
        discrepancy_id: Uuid,
        input: InvestigateInput,
    ) -> AppResult<DiscrepancyRecord> {
        if input.status == Some(DiscrepancyStatus::Resolved) {
            return Err(AppError::Validation {
                field: "status".to_string(),
                message: "Use the resolve operation to close a discrepancy".to_string(),
            });
        }

        let updated = sqlx::query(
            r#"
            UPDATE stock_discrepancies
            SET status = COALESCE($2, status),
                investigation_notes = COALESCE($3, investigation_notes)
            WHERE id = $1 AND status <> 'RESOLVED'
            "#,
        )
        .bind(discrepancy_id)
        .bind(input.status.map(|s| s.as_str()))
        .bind(&input.investigation_notes)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stock_discrepancies WHERE id = $1)",
            )
            .bind(discrepancy_id)
            .fetch_one(&self.db)
            .await?;
            return Err(if exists {
                AppError::InvalidStateTransition(
                    "Discrepancy is already resolved".to_string(),
                )
            } else {
                AppError::NotFound("Discrepancy".to_string())
            });
        }

        self.get(discrepancy_id).await
    }

    /// Resolve a discrepancy, optionally posting the corrective adjustment
    /// in the same transaction so the status change and the ledger repair
    /// land or roll back together.
    pub async fn resolve(
        &self,
        resolved_by: Uuid,
        discrepancy_id: Uuid,
        input: ResolveDiscrepancyInput,
    ) -> AppResult<DiscrepancyRecord> {
        if input.resolution_notes.trim().is_empty() {
            return Err(AppError::Validation {
                field: "resolution_notes".to_string(),
                message: "Resolution notes are required".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, (Uuid, Uuid, i32)>(
            r#"
            UPDATE stock_discrepancies
            SET status = 'RESOLVED', resolution_notes = $2, resolved_date = NOW()
            WHERE id = $1 AND status IN ('REPORTED', 'INVESTIGATING')
            RETURNING branch_id, item_id, actual_stock
            "#,
        )
        .bind(discrepancy_id)
        .bind(&input.resolution_notes)
        .fetch_optional(&mut *tx)
        .await?;

        let (branch_id, item_id, actual_stock) = match row {
            Some(row) => row,
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM stock_discrepancies WHERE id = $1)",
                )
                .bind(discrepancy_id)
                .fetch_one(&mut *tx)
                .await?;
                return Err(if exists {
                    AppError::InvalidStateTransition(
                        "Discrepancy is already resolved".to_string(),
                    )
                } else {
                    AppError::NotFound("Discrepancy".to_string())
                });
            }
        };

        if input.apply_adjustment {
            LedgerService::set_stock_level_in(
                &mut tx,
                resolved_by,
                item_id,
                branch_id,
                actual_stock,
                ReferenceType::Adjustment,
                Some(discrepancy_id),
                Some("Physical count adjustment".to_string()),
            )
            .await?;
        }

        tx.commit().await?;

        self.get(discrepancy_id).await
    }
}
