//! Authentication service for login and token management

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Input for refreshing an access token
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub branch_id: String,
    pub role_id: String,
    pub role_name: String,
    pub token_use: String, // "access" or "refresh"
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens plus the signed-in user's profile
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: LoginUser,
}

/// User profile returned on login
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub branch_code: String,
    pub role_id: Uuid,
    pub role_name: String,
}

/// Refreshed access token
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User row loaded for credential checks
#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    branch_id: Uuid,
    branch_name: String,
    branch_code: String,
    role_id: Uuid,
    role_name: String,
    password_hash: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Verify credentials, update last_login, and issue tokens
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let row = sqlx::query_as::<_, LoginRow>(
            r#"
            SELECT u.id, u.username, u.email, u.full_name,
                   u.branch_id, b.branch_name, b.branch_code,
                   u.role_id, r.role_name, u.password_hash, u.is_active
            FROM users u
            JOIN branches b ON u.branch_id = b.id
            JOIN roles r ON u.role_id = r.id
            WHERE u.username = $1
            "#,
        )
        .bind(&input.username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !row.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let matches = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(row.id)
            .execute(&self.db)
            .await?;

        let access_token = self.issue_token(&row, "access", self.access_token_expiry)?;
        let refresh_token = self.issue_token(&row, "refresh", self.refresh_token_expiry)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user: LoginUser {
                user_id: row.id,
                username: row.username,
                email: row.email,
                full_name: row.full_name,
                branch_id: row.branch_id,
                branch_name: row.branch_name,
                branch_code: row.branch_code,
                role_id: row.role_id,
                role_name: row.role_name,
            },
        })
    }

    /// Exchange a valid refresh token for a new access token. The user is
    /// re-checked against the database so deactivated accounts lose access
    /// at refresh time.
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<RefreshResponse> {
        let claims = decode::<Claims>(
            &input.refresh_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?
        .claims;

        if claims.token_use != "refresh" {
            return Err(AppError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        let row = sqlx::query_as::<_, LoginRow>(
            r#"
            SELECT u.id, u.username, u.email, u.full_name,
                   u.branch_id, b.branch_name, b.branch_code,
                   u.role_id, r.role_name, u.password_hash, u.is_active
            FROM users u
            JOIN branches b ON u.branch_id = b.id
            JOIN roles r ON u.role_id = r.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if !row.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.issue_token(&row, "access", self.access_token_expiry)?;

        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn issue_token(&self, row: &LoginRow, token_use: &str, expiry: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: row.id.to_string(),
            branch_id: row.branch_id.to_string(),
            role_id: row.role_id.to_string(),
            role_name: row.role_name.clone(),
            token_use: token_use.to_string(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }
}
