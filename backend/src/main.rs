//! Branch Inventory Management Platform - Backend Server
//!
//! A multi-branch inventory and warehouse-transfer backend: branches request
//! item transfers from other branches, requests are approved, dispatched and
//! received, and stock levels move through an auditable movement ledger.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bim_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Branch Inventory Management Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");

        ensure_bootstrap_admin(&db_pool).await?;
    }

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Branch Inventory Management Platform API v1.0"
}

/// Create a default admin account on an empty database so the API is
/// reachable after first start. Users have no self-registration; accounts
/// are administered through /api/v1/users.
async fn ensure_bootstrap_admin(db: &sqlx::PgPool) -> anyhow::Result<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    let role_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO roles (role_name, role_description)
         VALUES ('admin', 'System administrator')
         ON CONFLICT (role_name) DO UPDATE SET role_description = EXCLUDED.role_description
         RETURNING id",
    )
    .fetch_one(db)
    .await?;

    let branch_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO branches (branch_name, branch_code, city)
         VALUES ('Head Office', 'HQ', 'Central')
         ON CONFLICT (branch_code) DO UPDATE SET branch_name = EXCLUDED.branch_name
         RETURNING id",
    )
    .fetch_one(db)
    .await?;

    let password =
        std::env::var("BIM_ADMIN_PASSWORD").unwrap_or_else(|_| "changeme-admin".to_string());
    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;

    sqlx::query(
        "INSERT INTO users (username, email, full_name, branch_id, role_id, password_hash)
         VALUES ('admin', 'admin@example.com', 'Administrator', $1, $2, $3)",
    )
    .bind(branch_id)
    .bind(role_id)
    .bind(&password_hash)
    .execute(db)
    .await?;

    tracing::warn!("Created bootstrap admin user; change its password before exposing the API");
    Ok(())
}
