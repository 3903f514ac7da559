//! Ordering from a table

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{LiveEvent, Order, OrderTotals, PlaceOrderRequest, price_cart};

use crate::api::{ApiResult, internal};
use crate::auth::TableSession;
use crate::db;
use crate::state::AppState;

use super::session_table;

const MAX_NOTES_LEN: usize = 500;

/// POST /api/public/orders
pub async fn place_order(
    State(state): State<AppState>,
    session: TableSession,
    Json(req): Json<PlaceOrderRequest>,
) -> ApiResult<Order> {
    let customer = match &req.customer {
        Some(input) => input.normalized()?,
        None => None,
    };
    let notes = req
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Notes must be at most {MAX_NOTES_LEN} characters"),
        ));
    }

    let table = session_table(&state, &session).await?;
    let restaurant = db::restaurants::get(&state.pool, session.restaurant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    let menu = db::menu::list_available(&state.pool, restaurant.id)
        .await
        .map_err(internal)?;
    let items = price_cart(&req.items, &menu, table.zone_id)?;
    let totals = OrderTotals::compute(&items, restaurant.tax_rate);

    let order = db::orders::insert(
        &state.pool,
        restaurant.id,
        &db::orders::NewOrder {
            table_id: table.id,
            table_name: &table.name,
            zone_id: table.zone_id,
            customer: customer
                .as_ref()
                .map(|(phone, name)| (phone.as_str(), name.as_deref())),
            items: &items,
            totals,
            notes,
        },
    )
    .await?;

    tracing::info!(
        restaurant_id = restaurant.id,
        order_id = order.id,
        table_id = table.id,
        total = %order.total,
        "Order placed"
    );
    state
        .live
        .publish(restaurant.id, LiveEvent::OrderCreated(order.clone()));

    Ok(Json(order))
}

/// GET /api/public/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    session: TableSession,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = db::orders::get_for_table(&state.pool, session.restaurant_id, session.table_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{send, state};
    use crate::auth::session::SESSION_HEADER;
    use shared::error::ErrorCode;

    fn order_request(token: Option<&str>, body: serde_json::Value) -> http::Request<axum::body::Body> {
        let mut builder = http::Request::post("/api/public/orders")
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            builder = builder.header(SESSION_HEADER, t);
        }
        builder.body(axum::body::Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_order_needs_session() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            state(dir.path()),
            order_request(None, json!({"items": [{"menu_item_id": 1, "quantity": 1}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_customer_phone_rejected_before_db() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let (token, _) = st
            .sessions
            .issue(1, 2, chrono::Utc::now().timestamp())
            .unwrap();
        let (status, body) = send(
            st,
            order_request(
                Some(&token),
                json!({
                    "items": [{"menu_item_id": 1, "quantity": 1}],
                    "customer": {"name": "Ravi", "phone": "call me"}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::InvalidFormat.code());
    }

    #[tokio::test]
    async fn test_forged_session_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let forged = crate::auth::session::SessionKeys::new("guess", 180)
            .issue(1, 2, chrono::Utc::now().timestamp())
            .unwrap()
            .0;
        let (status, body) = send(
            state(dir.path()),
            order_request(Some(&forged), json!({"items": []})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::TokenInvalid.code());
    }
}
