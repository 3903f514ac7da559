//! Restaurant profile and key/value settings

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, RestaurantUpdate, Setting, SettingUpsert, validate_setting_key};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

/// GET /api/admin/restaurant
pub async fn get_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Restaurant> {
    let restaurant = db::restaurants::get(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    Ok(Json(restaurant))
}

/// PUT /api/admin/restaurant
pub async fn update_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<RestaurantUpdate>,
) -> ApiResult<Restaurant> {
    require_manager(&identity)?;
    data.validate()?;

    let restaurant = db::restaurants::update(&state.pool, identity.restaurant_id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        staff_id = identity.staff_id,
        "Restaurant profile updated"
    );
    Ok(Json(restaurant))
}

/// GET /api/admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<Setting>> {
    require_manager(&identity)?;
    let settings = db::settings::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(settings))
}

/// PUT /api/admin/settings/{key}
pub async fn upsert_setting(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(key): Path<String>,
    Json(data): Json<SettingUpsert>,
) -> ApiResult<Setting> {
    require_manager(&identity)?;
    validate_setting_key(&key)?;
    let setting = db::settings::upsert(&state.pool, identity.restaurant_id, &key, &data.value)
        .await
        .map_err(internal)?;
    Ok(Json(setting))
}

/// DELETE /api/admin/settings/{key}
pub async fn delete_setting(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(key): Path<String>,
) -> ApiResult<bool> {
    require_manager(&identity)?;
    let deleted = db::settings::delete(&state.pool, identity.restaurant_id, &key)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::SettingNotFound).with_detail("key", key));
    }
    Ok(Json(true))
}
