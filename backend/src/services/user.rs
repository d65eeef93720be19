//! User management service

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::validation::{validate_email, validate_password, validate_username};

/// User service for account administration
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// A user record with joined branch and role names. Never carries the
/// password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub branch_id: Uuid,
    pub role_id: Uuid,
    pub password: String,
}

/// Input for updating a user
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub branch_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Input for changing a password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub new_password: String,
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.full_name, u.phone,
           u.branch_id, b.branch_name, u.role_id, r.role_name,
           u.is_active, u.last_login, u.created_at, u.updated_at
    FROM users u
    JOIN branches b ON u.branch_id = b.id
    JOIN roles r ON u.role_id = r.id
"#;

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List users, active first
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<UserRecord>> {
        let query = format!(
            "{} WHERE u.is_active = TRUE OR $1 ORDER BY u.is_active DESC, u.full_name",
            USER_SELECT
        );
        let users = sqlx::query_as::<_, UserRecord>(&query)
            .bind(include_inactive)
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    /// Get a user by id
    pub async fn get(&self, user_id: Uuid) -> AppResult<UserRecord> {
        let query = format!("{} WHERE u.id = $1", USER_SELECT);
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Create a user with a server-side hashed password
    pub async fn create(&self, input: CreateUserInput) -> AppResult<UserRecord> {
        if let Err(msg) = validate_username(&input.username) {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: msg.to_string(),
            });
        }
        if let Err(msg) = validate_email(&input.email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
            });
        }
        if input.full_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "full_name".to_string(),
                message: "Full name cannot be empty".to_string(),
            });
        }
        if let Err(msg) = validate_password(&input.password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
            });
        }

        let branch_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(input.branch_id)
                .fetch_one(&self.db)
                .await?;
        if !branch_exists {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        let role_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
                .bind(input.role_id)
                .fetch_one(&self.db)
                .await?;
        if !role_exists {
            return Err(AppError::NotFound("Role".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, full_name, phone, branch_id, role_id, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(input.branch_id)
        .bind(input.role_id)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("username".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        self.get(user_id).await
    }

    /// Update a user; absent fields are left unchanged
    pub async fn update(&self, user_id: Uuid, input: UpdateUserInput) -> AppResult<UserRecord> {
        let existing = self.get(user_id).await?;

        let email = input.email.unwrap_or(existing.email);
        if let Err(msg) = validate_email(&email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
            });
        }
        let full_name = input.full_name.unwrap_or(existing.full_name);
        let phone = input.phone.or(existing.phone);
        let branch_id = input.branch_id.unwrap_or(existing.branch_id);
        let role_id = input.role_id.unwrap_or(existing.role_id);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        if branch_id != existing.branch_id {
            let branch_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)",
            )
            .bind(branch_id)
            .fetch_one(&self.db)
            .await?;
            if !branch_exists {
                return Err(AppError::NotFound("Branch".to_string()));
            }
        }
        if role_id != existing.role_id {
            let role_exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
                    .bind(role_id)
                    .fetch_one(&self.db)
                    .await?;
            if !role_exists {
                return Err(AppError::NotFound("Role".to_string()));
            }
        }

        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, full_name = $3, phone = $4, branch_id = $5, role_id = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&email)
        .bind(&full_name)
        .bind(&phone)
        .bind(branch_id)
        .bind(role_id)
        .bind(is_active)
        .execute(&self.db)
        .await?;

        self.get(user_id).await
    }

    /// Change a user's password
    pub async fn change_password(
        &self,
        user_id: Uuid,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        if let Err(msg) = validate_password(&input.new_password) {
            return Err(AppError::Validation {
                field: "new_password".to_string(),
                message: msg.to_string(),
            });
        }

        let password_hash = hash(&input.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(&password_hash)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }

    /// Deactivate a user account
    pub async fn deactivate(&self, user_id: Uuid) -> AppResult<UserRecord> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        self.get(user_id).await
    }
}
