use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Customer, CustomerQuery, Order};

use crate::api::{ApiResult, internal};
use crate::auth::StaffIdentity;
use crate::db;
use crate::state::AppState;

const RECENT_ORDERS: i64 = 10;

#[derive(Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub recent_orders: Vec<Order>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Vec<Customer>> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let customers = db::customers::list(
        &state.pool,
        identity.restaurant_id,
        search,
        query.limit.unwrap_or(50),
    )
    .await
    .map_err(internal)?;
    Ok(Json(customers))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<CustomerDetail> {
    let customer = db::customers::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
    let recent_orders =
        db::customers::recent_orders(&state.pool, identity.restaurant_id, id, RECENT_ORDERS)
            .await
            .map_err(internal)?;
    Ok(Json(CustomerDetail {
        customer,
        recent_orders,
    }))
}
