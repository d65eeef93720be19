//! HTTP handlers for item catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::item::{
    BatchMinStockInput, BatchPriceInput, BatchUpdateResult, CreateItemInput, ItemRecord,
    ItemService, UpdateItemInput,
};
use crate::AppState;

/// Query options for item listings
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List items
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<ItemRecord>>> {
    let service = ItemService::new(state.db);
    let items = service.list(query.include_inactive).await?;
    Ok(Json(items))
}

/// Get an item
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemRecord>> {
    let service = ItemService::new(state.db);
    let item = service.get(item_id).await?;
    Ok(Json(item))
}

/// Active items in a category
pub async fn get_items_by_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Vec<ItemRecord>>> {
    let service = ItemService::new(state.db);
    let items = service.by_category(category_id).await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<ItemRecord>> {
    let service = ItemService::new(state.db);
    let item = service.create(input).await?;
    Ok(Json(item))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<ItemRecord>> {
    let service = ItemService::new(state.db);
    let item = service.update(item_id, input).await?;
    Ok(Json(item))
}

/// Deactivate an item
pub async fn deactivate_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemRecord>> {
    let service = ItemService::new(state.db);
    let item = service.deactivate(item_id).await?;
    Ok(Json(item))
}

/// Set minimum stock level for every item in a category
pub async fn batch_update_min_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<BatchMinStockInput>,
) -> AppResult<Json<BatchUpdateResult>> {
    let service = ItemService::new(state.db);
    let result = service.batch_update_min_stock(input).await?;
    Ok(Json(result))
}

/// Apply a percentage price change to every item in a category
pub async fn batch_update_prices(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<BatchPriceInput>,
) -> AppResult<Json<BatchUpdateResult>> {
    let service = ItemService::new(state.db);
    let result = service.batch_update_prices(input).await?;
    Ok(Json(result))
}
