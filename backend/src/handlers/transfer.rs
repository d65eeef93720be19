//! HTTP handlers for transfer request endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::transfer::{
    ApproveTransferInput, BatchApprovalResult, CreateTransferInput, RejectTransferInput,
    TransferItemRecord, TransferRequestRecord, TransferService, TransferSummary,
};
use crate::AppState;
use shared::types::Pagination;

/// Create a transfer request
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<TransferRequestRecord>> {
    let service = TransferService::new(state.db);
    let transfer = service.create(current_user.0.user_id, input).await?;
    Ok(Json(transfer))
}

/// List transfer requests
pub async fn list_transfers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<TransferSummary>>> {
    let service = TransferService::new(state.db);
    let transfers = service.list_transfers(pagination).await?;
    Ok(Json(transfers))
}

/// Pending requests awaiting approval at a source branch
pub async fn get_pending_transfers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<TransferSummary>>> {
    let service = TransferService::new(state.db);
    let transfers = service.pending_for_branch(branch_id).await?;
    Ok(Json(transfers))
}

/// Get a transfer request
pub async fn get_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferRequestRecord>> {
    let service = TransferService::new(state.db);
    let transfer = service.get_transfer(transfer_id).await?;
    Ok(Json(transfer))
}

/// Line items of a transfer request
pub async fn get_transfer_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<Vec<TransferItemRecord>>> {
    let service = TransferService::new(state.db);
    let items = service.get_items(transfer_id).await?;
    Ok(Json(items))
}

/// Approve a pending transfer
pub async fn approve_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<ApproveTransferInput>,
) -> AppResult<Json<TransferRequestRecord>> {
    let service = TransferService::new(state.db);
    let transfer = service
        .approve(transfer_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Reject a pending transfer
pub async fn reject_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
    Json(input): Json<RejectTransferInput>,
) -> AppResult<Json<TransferRequestRecord>> {
    let service = TransferService::new(state.db);
    let transfer = service
        .reject(transfer_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}

/// Cancel a pending or approved transfer
pub async fn cancel_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferRequestRecord>> {
    let service = TransferService::new(state.db);
    let transfer = service.cancel(transfer_id).await?;
    Ok(Json(transfer))
}

/// Input for batch-approving low priority transfers from a branch
#[derive(Debug, Deserialize)]
pub struct BatchApproveInput {
    pub from_branch_id: Uuid,
}

/// Approve all pending LOW-priority transfers out of a branch
pub async fn approve_low_priority_transfers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BatchApproveInput>,
) -> AppResult<Json<BatchApprovalResult>> {
    let service = TransferService::new(state.db);
    let result = service
        .approve_low_priority(input.from_branch_id, current_user.0.user_id)
        .await?;
    Ok(Json(result))
}
