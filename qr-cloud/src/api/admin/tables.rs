//! Dining tables and their QR codes

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QrLink, QuotaResource, qr_url,
};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, quota, require_manager};
use crate::db;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::new(ErrorCode::TableNotFound)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<DiningTable>> {
    let tables = db::tables::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(tables))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<DiningTableCreate>,
) -> ApiResult<DiningTable> {
    require_manager(&identity)?;
    data.validate()?;
    quota::enforce(&state.pool, identity.restaurant_id, QuotaResource::Tables).await?;

    let table = db::tables::create(&state.pool, identity.restaurant_id, &data).await?;
    tracing::info!(
        restaurant_id = identity.restaurant_id,
        table_id = table.id,
        zone_id = ?table.zone_id,
        "Table created"
    );
    Ok(Json(table))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<DiningTableUpdate>,
) -> ApiResult<DiningTable> {
    require_manager(&identity)?;
    data.validate()?;
    let table = db::tables::update(&state.pool, identity.restaurant_id, id, &data)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(table))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    require_manager(&identity)?;
    let deleted = db::tables::soft_delete(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found());
    }
    tracing::info!(restaurant_id = identity.restaurant_id, table_id = id, "Table deleted");
    Ok(Json(true))
}

/// POST /api/admin/tables/{id}/regenerate-qr
pub async fn regenerate_qr(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<QrLink> {
    require_manager(&identity)?;
    let table = db::tables::regenerate_qr(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    tracing::info!(restaurant_id = identity.restaurant_id, table_id = id, "QR code regenerated");
    Ok(Json(link(&state, &table)))
}

/// GET /api/admin/tables/{id}/qr
pub async fn qr_link(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<QrLink> {
    let table = db::tables::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(link(&state, &table)))
}

fn link(state: &AppState, table: &DiningTable) -> QrLink {
    QrLink {
        table_id: table.id,
        url: qr_url(&state.public_base_url, &table.qr_token),
    }
}
