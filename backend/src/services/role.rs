//! Role management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};

/// Role service
#[derive(Clone)]
pub struct RoleService {
    db: PgPool,
}

/// A role record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleRecord {
    pub id: Uuid,
    pub role_name: String,
    pub role_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a role
#[derive(Debug, Deserialize)]
pub struct CreateRoleInput {
    pub role_name: String,
    pub role_description: Option<String>,
}

/// Input for updating a role
#[derive(Debug, Deserialize)]
pub struct UpdateRoleInput {
    pub role_name: Option<String>,
    pub role_description: Option<String>,
}

impl RoleService {
    /// Create a new RoleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all roles
    pub async fn list(&self) -> AppResult<Vec<RoleRecord>> {
        let roles = sqlx::query_as::<_, RoleRecord>(
            "SELECT id, role_name, role_description, created_at FROM roles ORDER BY role_name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(roles)
    }

    /// Get a role by id
    pub async fn get(&self, role_id: Uuid) -> AppResult<RoleRecord> {
        sqlx::query_as::<_, RoleRecord>(
            "SELECT id, role_name, role_description, created_at FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role".to_string()))
    }

    /// Create a role
    pub async fn create(&self, input: CreateRoleInput) -> AppResult<RoleRecord> {
        if input.role_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "role_name".to_string(),
                message: "Role name cannot be empty".to_string(),
            });
        }

        let role = sqlx::query_as::<_, RoleRecord>(
            r#"
            INSERT INTO roles (role_name, role_description)
            VALUES ($1, $2)
            RETURNING id, role_name, role_description, created_at
            "#,
        )
        .bind(&input.role_name)
        .bind(&input.role_description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("role_name".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        Ok(role)
    }

    /// Update a role; absent fields are left unchanged
    pub async fn update(&self, role_id: Uuid, input: UpdateRoleInput) -> AppResult<RoleRecord> {
        let existing = self.get(role_id).await?;

        let role_name = input.role_name.unwrap_or(existing.role_name);
        if role_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "role_name".to_string(),
                message: "Role name cannot be empty".to_string(),
            });
        }
        let role_description = input.role_description.or(existing.role_description);

        let role = sqlx::query_as::<_, RoleRecord>(
            r#"
            UPDATE roles
            SET role_name = $2, role_description = $3
            WHERE id = $1
            RETURNING id, role_name, role_description, created_at
            "#,
        )
        .bind(role_id)
        .bind(&role_name)
        .bind(&role_description)
        .fetch_one(&self.db)
        .await?;

        Ok(role)
    }

    /// Delete a role. Refused while users still reference it.
    pub async fn delete(&self, role_id: Uuid) -> AppResult<()> {
        let referenced =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = $1")
                .bind(role_id)
                .fetch_one(&self.db)
                .await?;
        if referenced > 0 {
            return Err(AppError::Conflict(
                "Role is still assigned to users".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Role".to_string()));
        }

        Ok(())
    }
}
