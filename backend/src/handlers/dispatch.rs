//! HTTP handlers for dispatch slip endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::transfer::{
    DispatchInput, DispatchItemRecord, DispatchRecord, TransferService,
};
use crate::AppState;
use shared::types::Pagination;

/// Dispatch an approved transfer, creating its dispatch slip
pub async fn create_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DispatchInput>,
) -> AppResult<Json<DispatchRecord>> {
    let service = TransferService::new(state.db);
    let dispatch = service.dispatch(current_user.0.user_id, input).await?;
    Ok(Json(dispatch))
}

/// List dispatch slips
pub async fn list_dispatches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<DispatchRecord>>> {
    let service = TransferService::new(state.db);
    let dispatches = service.list_dispatches(pagination).await?;
    Ok(Json(dispatches))
}

/// Get a dispatch slip
pub async fn get_dispatch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
) -> AppResult<Json<DispatchRecord>> {
    let service = TransferService::new(state.db);
    let dispatch = service.get_dispatch(dispatch_id).await?;
    Ok(Json(dispatch))
}

/// Items on a dispatch slip
pub async fn get_dispatch_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
) -> AppResult<Json<Vec<DispatchItemRecord>>> {
    let service = TransferService::new(state.db);
    let items = service.get_dispatch_items(dispatch_id).await?;
    Ok(Json(items))
}
