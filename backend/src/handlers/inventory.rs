//! HTTP handlers for inventory endpoints
//!
//! Read views plus the ledger entry points: adjust, set-level, reserve,
//! release and reconcile.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    BranchStockEntry, InventoryService, ItemStockAcrossBranches, ItemStockEntry, LowStockItem,
    OutOfStockItem,
};
use crate::services::ledger::{
    LedgerService, MovementRecord, PostMovementInput, ReservationInput, SetStockLevelInput,
};
use crate::AppState;

/// Stock for all active items at a branch
pub async fn get_branch_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchStockEntry>>> {
    let service = InventoryService::new(state.db);
    let stock = service.branch_stock(branch_id).await?;
    Ok(Json(stock))
}

/// Stock of one item at one branch
pub async fn get_item_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((item_id, branch_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ItemStockEntry>> {
    let service = InventoryService::new(state.db);
    let stock = service.item_stock(item_id, branch_id).await?;
    Ok(Json(stock))
}

/// Stock of an item across all active branches
pub async fn get_item_stock_across_branches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<ItemStockAcrossBranches>>> {
    let service = InventoryService::new(state.db);
    let stock = service.item_stock_across_branches(item_id).await?;
    Ok(Json(stock))
}

/// Items at or below their minimum stock level at a branch
pub async fn get_low_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let service = InventoryService::new(state.db);
    let items = service.low_stock(branch_id).await?;
    Ok(Json(items))
}

/// Items with no available stock at a branch
pub async fn get_out_of_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<OutOfStockItem>>> {
    let service = InventoryService::new(state.db);
    let items = service.out_of_stock(branch_id).await?;
    Ok(Json(items))
}

/// Post a stock movement (delta form)
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<PostMovementInput>,
) -> AppResult<Json<MovementRecord>> {
    let service = LedgerService::new(state.db);
    let movement = service.post_movement(current_user.0.user_id, input).await?;
    Ok(Json(movement))
}

/// Post an adjustment bringing stock to an absolute level (count form)
pub async fn set_stock_level(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SetStockLevelInput>,
) -> AppResult<Json<Option<MovementRecord>>> {
    let service = LedgerService::new(state.db);
    let movement = service
        .set_stock_level(current_user.0.user_id, input)
        .await?;
    Ok(Json(movement))
}

/// Reserve available stock
pub async fn reserve_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<()>> {
    let service = LedgerService::new(state.db);
    service
        .reserve(input.item_id, input.branch_id, input.quantity)
        .await?;
    Ok(Json(()))
}

/// Release reserved stock
pub async fn release_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<()>> {
    let service = LedgerService::new(state.db);
    service
        .release(input.item_id, input.branch_id, input.quantity)
        .await?;
    Ok(Json(()))
}

/// Input for rebuilding a balance from movement history
#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    pub item_id: Uuid,
    pub branch_id: Uuid,
}

/// Result of a reconciliation
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub item_id: Uuid,
    pub branch_id: Uuid,
    pub current_stock: i32,
}

/// Rebuild a balance by replaying the movement log
pub async fn reconcile_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<ReconcileInput>,
) -> AppResult<Json<ReconcileResponse>> {
    let service = LedgerService::new(state.db);
    let current_stock = service
        .reconcile_from_history(input.item_id, input.branch_id)
        .await?;
    Ok(Json(ReconcileResponse {
        item_id: input.item_id,
        branch_id: input.branch_id,
        current_stock,
    }))
}
