use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Zone, ZoneCreate, ZoneUpdate};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<Zone>> {
    let zones = db::zones::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(zones))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<ZoneCreate>,
) -> ApiResult<Zone> {
    require_manager(&identity)?;
    data.validate()?;
    let zone = db::zones::create(&state.pool, identity.restaurant_id, &data).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, zone_id = zone.id, "Zone created");
    Ok(Json(zone))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<ZoneUpdate>,
) -> ApiResult<Zone> {
    require_manager(&identity)?;
    data.validate()?;
    let zone = db::zones::update(&state.pool, identity.restaurant_id, id, &data)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ZoneNotFound))?;
    Ok(Json(zone))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    require_manager(&identity)?;
    db::zones::soft_delete(&state.pool, identity.restaurant_id, id).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, zone_id = id, "Zone deleted");
    Ok(Json(true))
}
