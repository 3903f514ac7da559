//! Order board: listing, kitchen status changes and payments

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{LiveEvent, Order, OrderQuery, OrderStatusUpdate, Payment, RecordPayment};

use crate::api::{ApiResult, internal};
use crate::auth::StaffIdentity;
use crate::db;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PaymentReceipt {
    pub order: Order,
    pub payment: Payment,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Vec<Order>> {
    let orders = db::orders::list(&state.pool, identity.restaurant_id, &query)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = db::orders::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(order))
}

/// PUT /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let order = db::orders::update_status(&state.pool, identity.restaurant_id, id, data.status).await?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        order_id = id,
        status = %order.status,
        staff_id = identity.staff_id,
        "Order status changed"
    );
    state
        .live
        .publish(identity.restaurant_id, LiveEvent::OrderUpdated(order.clone()));
    Ok(Json(order))
}

/// POST /api/admin/orders/{id}/payments
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<RecordPayment>,
) -> ApiResult<PaymentReceipt> {
    let (order, payment) = db::orders::record_payment(
        &state.pool,
        identity.restaurant_id,
        id,
        &data,
        identity.staff_id,
    )
    .await?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        order_id = id,
        payment_id = payment.id,
        method = %payment.method,
        amount = %payment.amount,
        "Order paid"
    );
    state
        .live
        .publish(identity.restaurant_id, LiveEvent::OrderUpdated(order.clone()));
    Ok(Json(PaymentReceipt { order, payment }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared::models::StaffRole;

    use crate::api::test_support::{send, state};
    use crate::auth::staff_auth::create_token;

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let token = create_token(10, 1, StaffRole::Chef, "test-jwt-secret").unwrap();
        let request = Request::put("/api/admin/orders/7/status")
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"eaten"}"#))
            .unwrap();
        let (status, _) = send(state(dir.path()), request).await;
        assert!(status.is_client_error());
        assert_ne!(status, StatusCode::UNAUTHORIZED);
    }
}
