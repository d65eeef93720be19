//! HTTP handlers for branch management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::branch::{
    BranchRecord, BranchService, BranchSummary, CreateBranchInput, UpdateBranchInput,
};
use crate::AppState;

/// Query options for branch listings
#[derive(Debug, Default, Deserialize)]
pub struct ListBranchesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List branches
pub async fn list_branches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListBranchesQuery>,
) -> AppResult<Json<Vec<BranchRecord>>> {
    let service = BranchService::new(state.db);
    let branches = service.list(query.include_inactive).await?;
    Ok(Json(branches))
}

/// Compact list of active branches
pub async fn branch_summaries(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<BranchSummary>>> {
    let service = BranchService::new(state.db);
    let branches = service.summaries().await?;
    Ok(Json(branches))
}

/// Get a branch
pub async fn get_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<BranchRecord>> {
    let service = BranchService::new(state.db);
    let branch = service.get(branch_id).await?;
    Ok(Json(branch))
}

/// Create a branch
pub async fn create_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateBranchInput>,
) -> AppResult<Json<BranchRecord>> {
    let service = BranchService::new(state.db);
    let branch = service.create(input).await?;
    Ok(Json(branch))
}

/// Update a branch
pub async fn update_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
    Json(input): Json<UpdateBranchInput>,
) -> AppResult<Json<BranchRecord>> {
    let service = BranchService::new(state.db);
    let branch = service.update(branch_id, input).await?;
    Ok(Json(branch))
}

/// Deactivate a branch
pub async fn deactivate_branch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<BranchRecord>> {
    let service = BranchService::new(state.db);
    let branch = service.deactivate(branch_id).await?;
    Ok(Json(branch))
}
