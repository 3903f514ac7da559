use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{AvailabilityUpdate, MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::new(ErrorCode::MenuItemNotFound)
}

/// Full menu, unavailable items included
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<MenuItem>> {
    let items = db::menu::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<MenuItem> {
    let item = db::menu::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(item))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<MenuItemCreate>,
) -> ApiResult<MenuItem> {
    require_manager(&identity)?;
    data.validate()?;
    let item = db::menu::create(&state.pool, identity.restaurant_id, &data)
        .await
        .map_err(internal)?;
    tracing::info!(restaurant_id = identity.restaurant_id, menu_item_id = item.id, "Menu item created");
    Ok(Json(item))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    require_manager(&identity)?;
    data.validate()?;
    let item = db::menu::update(&state.pool, identity.restaurant_id, id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(item))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    require_manager(&identity)?;
    let deleted = db::menu::soft_delete(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found());
    }
    Ok(Json(true))
}

/// PUT /api/admin/menu/{id}/availability
///
/// Any staff member may mark an item sold out.
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<AvailabilityUpdate>,
) -> ApiResult<MenuItem> {
    let item = db::menu::set_availability(&state.pool, identity.restaurant_id, id, data.is_available)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    tracing::info!(
        restaurant_id = identity.restaurant_id,
        menu_item_id = id,
        is_available = data.is_available,
        staff_id = identity.staff_id,
        "Menu availability changed"
    );
    Ok(Json(item))
}
