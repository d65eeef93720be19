//! HTTP handlers for receiving slip endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::transfer::{
    ReceiveInput, ReceivingItemRecord, ReceivingRecord, TransferService,
};
use crate::AppState;
use shared::types::Pagination;

/// Receive an in-transit transfer, creating its receiving slip
pub async fn create_receiving(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReceiveInput>,
) -> AppResult<Json<ReceivingRecord>> {
    let service = TransferService::new(state.db);
    let receiving = service.receive(current_user.0.user_id, input).await?;
    Ok(Json(receiving))
}

/// List receiving slips
pub async fn list_receivings(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<ReceivingRecord>>> {
    let service = TransferService::new(state.db);
    let receivings = service.list_receivings(pagination).await?;
    Ok(Json(receivings))
}

/// Get a receiving slip
pub async fn get_receiving(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(receiving_id): Path<Uuid>,
) -> AppResult<Json<ReceivingRecord>> {
    let service = TransferService::new(state.db);
    let receiving = service.get_receiving(receiving_id).await?;
    Ok(Json(receiving))
}

/// Items on a receiving slip
pub async fn get_receiving_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(receiving_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReceivingItemRecord>>> {
    let service = TransferService::new(state.db);
    let items = service.get_receiving_items(receiving_id).await?;
    Ok(Json(items))
}
