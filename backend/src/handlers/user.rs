//! HTTP handlers for user management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::user::{
    ChangePasswordInput, CreateUserInput, UpdateUserInput, UserRecord, UserService,
};
use crate::AppState;

/// Query options for user listings
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<UserRecord>>> {
    let service = UserService::new(state.db);
    let users = service.list(query.include_inactive).await?;
    Ok(Json(users))
}

/// Get a user
pub async fn get_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserRecord>> {
    let service = UserService::new(state.db);
    let user = service.get(user_id).await?;
    Ok(Json(user))
}

/// Create a user
pub async fn create_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<UserRecord>> {
    let service = UserService::new(state.db);
    let user = service.create(input).await?;
    Ok(Json(user))
}

/// Update a user
pub async fn update_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<UserRecord>> {
    let service = UserService::new(state.db);
    let user = service.update(user_id, input).await?;
    Ok(Json(user))
}

/// Change a user's password
pub async fn change_password(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<Json<()>> {
    let service = UserService::new(state.db);
    service.change_password(user_id, input).await?;
    Ok(Json(()))
}

/// Deactivate a user
pub async fn deactivate_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserRecord>> {
    let service = UserService::new(state.db);
    let user = service.deactivate(user_id).await?;
    Ok(Json(user))
}
