//! HTTP handlers for stock discrepancy endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::discrepancy::{
    DiscrepancyRecord, DiscrepancyService, InvestigateInput, ReportDiscrepancyInput,
    ResolveDiscrepancyInput,
};
use crate::AppState;

/// Report a stock discrepancy
pub async fn report_discrepancy(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReportDiscrepancyInput>,
) -> AppResult<Json<DiscrepancyRecord>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancy = service.report(current_user.0.user_id, input).await?;
    Ok(Json(discrepancy))
}

/// List all discrepancies
pub async fn list_discrepancies(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<DiscrepancyRecord>>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancies = service.list().await?;
    Ok(Json(discrepancies))
}

/// Unresolved reports, largest absolute difference first
pub async fn get_pending_discrepancies(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<DiscrepancyRecord>>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancies = service.pending().await?;
    Ok(Json(discrepancies))
}

/// Get a discrepancy
pub async fn get_discrepancy(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(discrepancy_id): Path<Uuid>,
) -> AppResult<Json<DiscrepancyRecord>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancy = service.get(discrepancy_id).await?;
    Ok(Json(discrepancy))
}

/// Update investigation status or notes
pub async fn investigate_discrepancy(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(discrepancy_id): Path<Uuid>,
    Json(input): Json<InvestigateInput>,
) -> AppResult<Json<DiscrepancyRecord>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancy = service.investigate(discrepancy_id, input).await?;
    Ok(Json(discrepancy))
}

/// Resolve a discrepancy, optionally applying the corrective adjustment
pub async fn resolve_discrepancy(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(discrepancy_id): Path<Uuid>,
    Json(input): Json<ResolveDiscrepancyInput>,
) -> AppResult<Json<DiscrepancyRecord>> {
    let service = DiscrepancyService::new(state.db);
    let discrepancy = service
        .resolve(current_user.0.user_id, discrepancy_id, input)
        .await?;
    Ok(Json(discrepancy))
}
