//! Branch management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::validation::validate_branch_code;

/// Branch service for managing physical locations
#[derive(Clone)]
pub struct BranchService {
    db: PgPool,
}

/// A branch record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BranchRecord {
    pub id: Uuid,
    pub branch_name: String,
    pub branch_code: String,
    pub city: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub branch_manager_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact branch row for selection lists
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BranchSummary {
    pub id: Uuid,
    pub branch_name: String,
    pub branch_code: String,
}

/// Input for creating a branch
#[derive(Debug, Deserialize)]
pub struct CreateBranchInput {
    pub branch_name: String,
    pub branch_code: String,
    pub city: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub branch_manager_name: Option<String>,
}

/// Input for updating a branch
#[derive(Debug, Deserialize)]
pub struct UpdateBranchInput {
    pub branch_name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub branch_manager_name: Option<String>,
    pub is_active: Option<bool>,
}

const BRANCH_COLUMNS: &str = "id, branch_name, branch_code, city, address, phone, email, \
                              branch_manager_name, is_active, created_at, updated_at";

impl BranchService {
    /// Create a new BranchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List branches, active first
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<BranchRecord>> {
        let query = format!(
            "SELECT {} FROM branches WHERE is_active = TRUE OR $1 \
             ORDER BY is_active DESC, branch_name",
            BRANCH_COLUMNS
        );
        let branches = sqlx::query_as::<_, BranchRecord>(&query)
            .bind(include_inactive)
            .fetch_all(&self.db)
            .await?;
        Ok(branches)
    }

    /// Compact list of active branches
    pub async fn summaries(&self) -> AppResult<Vec<BranchSummary>> {
        let branches = sqlx::query_as::<_, BranchSummary>(
            "SELECT id, branch_name, branch_code FROM branches WHERE is_active = TRUE \
             ORDER BY branch_name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(branches)
    }

    /// Get a branch by id
    pub async fn get(&self, branch_id: Uuid) -> AppResult<BranchRecord> {
        let query = format!("SELECT {} FROM branches WHERE id = $1", BRANCH_COLUMNS);
        sqlx::query_as::<_, BranchRecord>(&query)
            .bind(branch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Branch".to_string()))
    }

    /// Create a branch
    pub async fn create(&self, input: CreateBranchInput) -> AppResult<BranchRecord> {
        if input.branch_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "branch_name".to_string(),
                message: "Branch name cannot be empty".to_string(),
            });
        }
        if let Err(msg) = validate_branch_code(&input.branch_code) {
            return Err(AppError::Validation {
                field: "branch_code".to_string(),
                message: msg.to_string(),
            });
        }

        let query = format!(
            r#"
            INSERT INTO branches (branch_name, branch_code, city, address, phone, email, branch_manager_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BRANCH_COLUMNS
        );
        let branch = sqlx::query_as::<_, BranchRecord>(&query)
            .bind(&input.branch_name)
            .bind(&input.branch_code)
            .bind(&input.city)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.branch_manager_name)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateEntry("branch_code".to_string())
                } else {
                    AppError::DatabaseError(e)
                }
            })?;

        Ok(branch)
    }

    /// Update a branch; absent fields are left unchanged
    pub async fn update(&self, branch_id: Uuid, input: UpdateBranchInput) -> AppResult<BranchRecord> {
        let existing = self.get(branch_id).await?;

        let branch_name = input.branch_name.unwrap_or(existing.branch_name);
        if branch_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "branch_name".to_string(),
                message: "Branch name cannot be empty".to_string(),
            });
        }
        let city = input.city.unwrap_or(existing.city);
        let address = input.address.or(existing.address);
        let phone = input.phone.or(existing.phone);
        let email = input.email.or(existing.email);
        let branch_manager_name = input.branch_manager_name.or(existing.branch_manager_name);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        let query = format!(
            r#"
            UPDATE branches
            SET branch_name = $2, city = $3, address = $4, phone = $5, email = $6,
                branch_manager_name = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BRANCH_COLUMNS
        );
        let branch = sqlx::query_as::<_, BranchRecord>(&query)
            .bind(branch_id)
            .bind(&branch_name)
            .bind(&city)
            .bind(&address)
            .bind(&phone)
            .bind(&email)
            .bind(&branch_manager_name)
            .bind(is_active)
            .fetch_one(&self.db)
            .await?;

        Ok(branch)
    }

    /// Deactivate a branch. Branches are never hard-deleted while inventory
    /// or transfer history references them; listings filter on the flag.
    pub async fn deactivate(&self, branch_id: Uuid) -> AppResult<BranchRecord> {
        let result = sqlx::query(
            "UPDATE branches SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(branch_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        self.get(branch_id).await
    }
}
