//! HTTP handlers for reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::report::{
    DashboardResponse, MostRequestedEntry, ReportService, StockAgingEntry, StockSummaryEntry,
    StockValuationEntry, TransferPerformanceEntry, TransferSummaryEntry, UserActivityEntry,
};
use crate::AppState;
use shared::types::DateRange;

/// Query options for the stock aging report
#[derive(Debug, Deserialize)]
pub struct AgingQuery {
    #[serde(default = "default_aging_days")]
    pub older_than_days: i32,
}

fn default_aging_days() -> i32 {
    90
}

/// Stock totals per branch
pub async fn get_stock_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockSummaryEntry>>> {
    let service = ReportService::new(state.db);
    let summary = service.stock_summary().await?;
    Ok(Json(summary))
}

/// Stock valuation at current unit prices
pub async fn get_stock_valuation(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockValuationEntry>>> {
    let service = ReportService::new(state.db);
    let valuation = service.stock_valuation().await?;
    Ok(Json(valuation))
}

/// Stock without recent movement
pub async fn get_stock_aging(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<AgingQuery>,
) -> AppResult<Json<Vec<StockAgingEntry>>> {
    let service = ReportService::new(state.db);
    let aging = service.stock_aging(query.older_than_days).await?;
    Ok(Json(aging))
}

/// Daily transfer counts for a date range
pub async fn get_transfer_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(range): Query<DateRange>,
) -> AppResult<Json<Vec<TransferSummaryEntry>>> {
    let service = ReportService::new(state.db);
    let summary = service.transfer_summary(range).await?;
    Ok(Json(summary))
}

/// Most requested items for a date range
pub async fn get_most_requested_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(range): Query<DateRange>,
) -> AppResult<Json<Vec<MostRequestedEntry>>> {
    let service = ReportService::new(state.db);
    let items = service.most_requested_items(range).await?;
    Ok(Json(items))
}

/// Transfer lifecycle durations per branch pair
pub async fn get_transfer_performance(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(range): Query<DateRange>,
) -> AppResult<Json<Vec<TransferPerformanceEntry>>> {
    let service = ReportService::new(state.db);
    let performance = service.transfer_performance(range).await?;
    Ok(Json(performance))
}

/// Operation counts per active user
pub async fn get_user_activity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<UserActivityEntry>>> {
    let service = ReportService::new(state.db);
    let activity = service.user_activity().await?;
    Ok(Json(activity))
}

/// Dashboard counters and recent activity
pub async fn get_dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardResponse>> {
    let service = ReportService::new(state.db);
    let dashboard = service.dashboard().await?;
    Ok(Json(dashboard))
}
