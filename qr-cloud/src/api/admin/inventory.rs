//! Stock items, restocks, order deductions and wastage
//!
//! All inventory endpoints are for owners and managers.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Deduction, DeductionQuery, InventoryItem, InventoryItemCreate, InventoryItemUpdate,
    RestockRequest, TimeRange, Wastage, WastageCreate, WastageSummary, summarize_wastage,
};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::new(ErrorCode::InventoryItemNotFound)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<InventoryItem>> {
    require_manager(&identity)?;
    let items = db::inventory::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<InventoryItem> {
    require_manager(&identity)?;
    let item = db::inventory::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(item))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<InventoryItemCreate>,
) -> ApiResult<InventoryItem> {
    require_manager(&identity)?;
    data.validate()?;
    let item = db::inventory::create(&state.pool, identity.restaurant_id, &data)
        .await
        .map_err(internal)?;
    Ok(Json(item))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<InventoryItemUpdate>,
) -> ApiResult<InventoryItem> {
    require_manager(&identity)?;
    data.validate()?;
    let item = db::inventory::update(&state.pool, identity.restaurant_id, id, &data)
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
    let deleted = db::inventory::soft_delete(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found());
    }
    Ok(Json(true))
}

/// POST /api/admin/inventory/{id}/restock
pub async fn restock(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<RestockRequest>,
) -> ApiResult<InventoryItem> {
    require_manager(&identity)?;
    data.validate()?;
    let item = db::inventory::restock(
        &state.pool,
        identity.restaurant_id,
        id,
        &data,
        identity.staff_id,
    )
    .await?;
    tracing::info!(
        restaurant_id = identity.restaurant_id,
        inventory_item_id = id,
        added = %data.quantity,
        quantity = %item.quantity,
        "Inventory restocked"
    );
    Ok(Json(item))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<InventoryItem>> {
    require_manager(&identity)?;
    let items = db::inventory::low_stock(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

pub async fn list_deductions(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<DeductionQuery>,
) -> ApiResult<Vec<Deduction>> {
    require_manager(&identity)?;
    let deductions = db::inventory::list_deductions(&state.pool, identity.restaurant_id, query.order_id)
        .await
        .map_err(internal)?;
    Ok(Json(deductions))
}

pub async fn record_wastage(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<WastageCreate>,
) -> ApiResult<Wastage> {
    require_manager(&identity)?;
    data.validate()?;
    let wastage =
        db::inventory::record_wastage(&state.pool, identity.restaurant_id, &data, identity.staff_id)
            .await?;
    tracing::info!(
        restaurant_id = identity.restaurant_id,
        inventory_item_id = data.inventory_item_id,
        quantity = %wastage.quantity,
        cost = %wastage.cost,
        "Wastage recorded"
    );
    Ok(Json(wastage))
}

pub async fn list_wastage(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(range): Query<TimeRange>,
) -> ApiResult<Vec<Wastage>> {
    require_manager(&identity)?;
    let (from, to) = range.bounds();
    let records = db::inventory::list_wastage(&state.pool, identity.restaurant_id, from, to)
        .await
        .map_err(internal)?;
    Ok(Json(records))
}

/// GET /api/admin/wastage/summary
pub async fn wastage_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(range): Query<TimeRange>,
) -> ApiResult<WastageSummary> {
    require_manager(&identity)?;
    let (from, to) = range.bounds();
    let records = db::inventory::list_wastage(&state.pool, identity.restaurant_id, from, to)
        .await
        .map_err(internal)?;
    Ok(Json(summarize_wastage(&records)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared::error::ErrorCode;
    use shared::models::StaffRole;

    use crate::api::test_support::{send, state};
    use crate::auth::staff_auth::create_token;

    #[tokio::test]
    async fn test_restock_quantity_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();
        let token = create_token(10, 1, StaffRole::Manager, "test-jwt-secret").unwrap();
        let request = Request::post("/api/admin/inventory/4/restock")
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"quantity":0}"#))
            .unwrap();
        let (status, body) = send(state(dir.path()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::InvalidInventoryQuantity.code());
    }
}
