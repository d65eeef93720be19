//! HTTP handlers for role management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::role::{CreateRoleInput, RoleRecord, RoleService, UpdateRoleInput};
use crate::AppState;

/// List roles
pub async fn list_roles(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<RoleRecord>>> {
    let service = RoleService::new(state.db);
    let roles = service.list().await?;
    Ok(Json(roles))
}

/// Get a role
pub async fn get_role(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
) -> AppResult<Json<RoleRecord>> {
    let service = RoleService::new(state.db);
    let role = service.get(role_id).await?;
    Ok(Json(role))
}

/// Create a role
pub async fn create_role(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateRoleInput>,
) -> AppResult<Json<RoleRecord>> {
    let service = RoleService::new(state.db);
    let role = service.create(input).await?;
    Ok(Json(role))
}

/// Update a role
pub async fn update_role(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
    Json(input): Json<UpdateRoleInput>,
) -> AppResult<Json<RoleRecord>> {
    let service = RoleService::new(state.db);
    let role = service.update(role_id, input).await?;
    Ok(Json(role))
}

/// Delete a role
pub async fn delete_role(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = RoleService::new(state.db);
    service.delete(role_id).await?;
    Ok(Json(()))
}
