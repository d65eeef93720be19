//! Item category management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::validation::validate_category_code;

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// A category record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub category_name: String,
    pub category_code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub category_name: String,
    pub category_code: String,
    pub description: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    pub category_name: Option<String>,
    pub description: Option<String>,
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all categories
    pub async fn list(&self) -> AppResult<Vec<CategoryRecord>> {
        let categories = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, category_name, category_code, description, created_at \
             FROM categories ORDER BY category_name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(categories)
    }

    /// Get a category by id
    pub async fn get(&self, category_id: Uuid) -> AppResult<CategoryRecord> {
        sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, category_name, category_code, description, created_at \
             FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    /// Create a category
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<CategoryRecord> {
        if input.category_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "category_name".to_string(),
                message: "Category name cannot be empty".to_string(),
            });
        }
        if let Err(msg) = validate_category_code(&input.category_code) {
            return Err(AppError::Validation {
                field: "category_code".to_string(),
                message: msg.to_string(),
            });
        }

        let category = sqlx::query_as::<_, CategoryRecord>(
            r#"
            INSERT INTO categories (category_name, category_code, description)
            VALUES ($1, $2, $3)
            RETURNING id, category_name, category_code, description, created_at
            "#,
        )
        .bind(&input.category_name)
        .bind(&input.category_code)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("category_code".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        Ok(category)
    }

    /// Update a category; absent fields are left unchanged
    pub async fn update(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<CategoryRecord> {
        let existing = self.get(category_id).await?;

        let category_name = input.category_name.unwrap_or(existing.category_name);
        if category_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "category_name".to_string(),
                message: "Category name cannot be empty".to_string(),
            });
        }
        let description = input.description.or(existing.description);

        let category = sqlx::query_as::<_, CategoryRecord>(
            r#"
            UPDATE categories
            SET category_name = $2, description = $3
            WHERE id = $1
            RETURNING id, category_name, category_code, description, created_at
            "#,
        )
        .bind(category_id)
        .bind(&category_name)
        .bind(&description)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// Delete a category. Refused while items still reference it.
    pub async fn delete(&self, category_id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM items WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;
        if referenced > 0 {
            return Err(AppError::Conflict(
                "Category is still referenced by items".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }
}
