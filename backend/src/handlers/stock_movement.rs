//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{LedgerService, MovementRecord, PostMovementInput};
use crate::services::movement::{MovementFilter, MovementService, MovementView};
use crate::AppState;
use shared::types::Pagination;

/// Post a movement through the ledger. Balance snapshots are computed by
/// the ledger, never supplied by the caller.
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<PostMovementInput>,
) -> AppResult<Json<MovementRecord>> {
    let service = LedgerService::new(state.db);
    let movement = service.post_movement(current_user.0.user_id, input).await?;
    Ok(Json(movement))
}

/// Get a movement by id
pub async fn get_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementView>> {
    let service = MovementService::new(state.db);
    let movement = service.get(movement_id).await?;
    Ok(Json(movement))
}

/// List movements with optional filters
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<MovementFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<MovementView>>> {
    let service = MovementService::new(state.db);
    let movements = service.list(filter, pagination).await?;
    Ok(Json(movements))
}

/// Movement history of an item
pub async fn get_item_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<MovementView>>> {
    let service = MovementService::new(state.db);
    let movements = service.for_item(item_id).await?;
    Ok(Json(movements))
}

/// Movement history of a branch
pub async fn get_branch_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<MovementView>>> {
    let service = MovementService::new(state.db);
    let movements = service.for_branch(branch_id).await?;
    Ok(Json(movements))
}
