//! Route definitions for the Branch Inventory Management Platform

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - role management
        .nest("/roles", role_routes())
        // Protected routes - branch management
        .nest("/branches", branch_routes())
        // Protected routes - category management
        .nest("/categories", category_routes())
        // Protected routes - item catalog
        .nest("/items", item_routes())
        // Protected routes - user management
        .nest("/users", user_routes())
        // Protected routes - inventory and ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - stock movement log
        .nest("/stock-movements", stock_movement_routes())
        // Protected routes - transfer lifecycle
        .nest("/transfers", transfer_routes())
        // Protected routes - dispatch slips
        .nest("/dispatches", dispatch_routes())
        // Protected routes - receiving slips
        .nest("/receivings", receiving_routes())
        // Protected routes - stock discrepancies
        .nest("/discrepancies", discrepancy_routes())
        // Protected routes - reports
        .nest("/reports", report_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Role management routes (protected)
fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_roles).post(handlers::create_role))
        .route(
            "/:role_id",
            get(handlers::get_role)
                .put(handlers::update_role)
                .delete(handlers::delete_role),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Branch management routes (protected)
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_branches).post(handlers::create_branch))
        .route("/summary", get(handlers::branch_summaries))
        .route(
            "/:branch_id",
            get(handlers::get_branch)
                .put(handlers::update_branch)
                .delete(handlers::deactivate_branch),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Category management routes (protected)
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Item catalog routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/category/:category_id", get(handlers::get_items_by_category))
        .route("/batch/min-stock", post(handlers::batch_update_min_stock))
        .route("/batch/prices", post(handlers::batch_update_prices))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::deactivate_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// User management routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:user_id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::deactivate_user),
        )
        .route("/:user_id/password", put(handlers::change_password))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory and ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Views
        .route("/branch/:branch_id", get(handlers::get_branch_stock))
        .route(
            "/branch/:branch_id/low-stock",
            get(handlers::get_low_stock_items),
        )
        .route(
            "/branch/:branch_id/out-of-stock",
            get(handlers::get_out_of_stock_items),
        )
        .route(
            "/item/:item_id/branch/:branch_id",
            get(handlers::get_item_stock),
        )
        .route(
            "/item/:item_id/branches",
            get(handlers::get_item_stock_across_branches),
        )
        // Ledger operations
        .route("/adjust", post(handlers::adjust_stock))
        .route("/set-level", post(handlers::set_stock_level))
        .route("/reserve", post(handlers::reserve_stock))
        .route("/release", post(handlers::release_stock))
        .route("/reconcile", post(handlers::reconcile_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock movement routes (protected)
fn stock_movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        .route("/item/:item_id", get(handlers::get_item_movements))
        .route("/branch/:branch_id", get(handlers::get_branch_movements))
        .route("/:movement_id", get(handlers::get_movement))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Transfer lifecycle routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/pending/:branch_id", get(handlers::get_pending_transfers))
        .route(
            "/batch/approve-low-priority",
            post(handlers::approve_low_priority_transfers),
        )
        .route("/:transfer_id", get(handlers::get_transfer))
        .route("/:transfer_id/items", get(handlers::get_transfer_items))
        .route("/:transfer_id/approve", post(handlers::approve_transfer))
        .route("/:transfer_id/reject", post(handlers::reject_transfer))
        .route("/:transfer_id/cancel", post(handlers::cancel_transfer))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dispatch slip routes (protected)
fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_dispatches).post(handlers::create_dispatch),
        )
        .route("/:dispatch_id", get(handlers::get_dispatch))
        .route("/:dispatch_id/items", get(handlers::get_dispatch_items))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Receiving slip routes (protected)
fn receiving_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_receivings).post(handlers::create_receiving),
        )
        .route("/:receiving_id", get(handlers::get_receiving))
        .route("/:receiving_id/items", get(handlers::get_receiving_items))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock discrepancy routes (protected)
fn discrepancy_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_discrepancies).post(handlers::report_discrepancy),
        )
        .route("/pending", get(handlers::get_pending_discrepancies))
        .route("/:discrepancy_id", get(handlers::get_discrepancy))
        .route(
            "/:discrepancy_id/investigate",
            patch(handlers::investigate_discrepancy),
        )
        .route(
            "/:discrepancy_id/resolve",
            patch(handlers::resolve_discrepancy),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/stock/summary", get(handlers::get_stock_summary))
        .route("/stock/valuation", get(handlers::get_stock_valuation))
        .route("/stock/aging", get(handlers::get_stock_aging))
        .route("/transfers/summary", get(handlers::get_transfer_summary))
        .route(
            "/transfers/most-requested",
            get(handlers::get_most_requested_items),
        )
        .route(
            "/transfers/performance",
            get(handlers::get_transfer_performance),
        )
        .route("/user-activity", get(handlers::get_user_activity))
        .route("/dashboard", get(handlers::get_dashboard))
        .route_layer(middleware::from_fn(auth_middleware))
}
