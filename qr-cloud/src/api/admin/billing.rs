//! Plan overview, subscription checkout and the payment ledger

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Payment, PaymentQuery, Subscription, SubscriptionCheckout, SubscriptionCreate,
    SubscriptionOverview, SubscriptionStatus, SubscriptionVerify, effective_plan,
};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

/// GET /api/admin/subscription
pub async fn overview(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<SubscriptionOverview> {
    require_manager(&identity)?;
    let rid = identity.restaurant_id;
    let subscription = db::subscriptions::latest(&state.pool, rid)
        .await
        .map_err(internal)?;
    let plan = effective_plan(subscription.as_ref());
    let table_count = db::tables::count(&state.pool, rid).await.map_err(internal)?;
    let staff_count = db::staff::count(&state.pool, rid).await.map_err(internal)?;

    Ok(Json(SubscriptionOverview {
        plan,
        limits: plan.limits(),
        subscription,
        table_count,
        staff_count,
    }))
}

/// POST /api/admin/subscription
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(req): Json<SubscriptionCreate>,
) -> ApiResult<SubscriptionCheckout> {
    require_manager(&identity)?;
    let plan = req.plan()?;
    let plan_id = state.gateway.plan_id(plan).ok_or_else(|| {
        AppError::with_message(ErrorCode::UnknownPlan, format!("Plan {plan} is not offered"))
    })?;

    let gateway_id = state
        .gateway
        .create_subscription(plan_id, identity.restaurant_id, plan)
        .await
        .map_err(|e| {
            tracing::error!(restaurant_id = identity.restaurant_id, plan = %plan, error = %e, "Gateway subscription failed");
            AppError::new(ErrorCode::PaymentSetupFailed)
        })?;

    let subscription = db::subscriptions::create(&state.pool, identity.restaurant_id, plan, &gateway_id)
        .await
        .map_err(internal)?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        subscription_id = subscription.id,
        plan = %plan,
        "Subscription checkout started"
    );
    Ok(Json(SubscriptionCheckout {
        subscription_id: gateway_id,
        key_id: state.gateway.key_id().to_string(),
        plan,
    }))
}

/// POST /api/admin/subscription/verify
///
/// Checkout callback. Activates the subscription once the gateway signature
/// over `payment_id|subscription_id` checks out.
pub async fn verify_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(req): Json<SubscriptionVerify>,
) -> ApiResult<Subscription> {
    require_manager(&identity)?;
    if !state
        .gateway
        .verify_payment_signature(&req.payment_id, &req.subscription_id, &req.signature)
    {
        tracing::warn!(
            restaurant_id = identity.restaurant_id,
            gateway_subscription_id = %req.subscription_id,
            "Subscription signature mismatch"
        );
        return Err(AppError::new(ErrorCode::SignatureInvalid));
    }

    // Best effort: without the amount the subscription.charged webhook records the payment
    let amount = match state.gateway.fetch_payment_amount(&req.payment_id).await {
        Ok(amount) => Some(amount),
        Err(e) => {
            tracing::warn!(payment_id = %req.payment_id, error = %e, "Could not fetch payment amount");
            None
        }
    };

    let mut tx = state.pool.begin().await.map_err(internal)?;
    let owned = db::subscriptions::find_by_gateway_id(&mut tx, &req.subscription_id)
        .await
        .map_err(internal)?
        .filter(|s| s.restaurant_id == identity.restaurant_id)
        .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound))?;

    let subscription = db::subscriptions::update_status(
        &mut tx,
        owned.subscription.id,
        SubscriptionStatus::Active,
        None,
    )
    .await
    .map_err(internal)?;

    if let Some(amount) = amount {
        db::payments::insert_subscription_payment(
            &mut tx,
            identity.restaurant_id,
            subscription.id,
            amount,
            &req.payment_id,
        )
        .await
        .map_err(internal)?;
    }
    tx.commit().await.map_err(internal)?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        subscription_id = subscription.id,
        plan = %subscription.plan,
        "Subscription activated"
    );
    Ok(Json(subscription))
}

/// GET /api/admin/payments
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Vec<Payment>> {
    require_manager(&identity)?;
    let payments = db::payments::list(&state.pool, identity.restaurant_id, query.kind)
        .await
        .map_err(internal)?;
    Ok(Json(payments))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;
    use shared::error::ErrorCode;
    use shared::models::StaffRole;

    use crate::api::test_support::{send, state};
    use crate::auth::staff_auth::create_token;

    fn request(path: &str, body: serde_json::Value) -> http::Request<axum::body::Body> {
        let token = create_token(10, 1, StaffRole::Owner, "test-jwt-secret").unwrap();
        http::Request::post(path)
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_free_plan_cannot_be_bought() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            request("/api/admin/subscription", json!({"plan": "free"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::UnknownPlan.code());
    }

    #[tokio::test]
    async fn test_forged_checkout_signature() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            request(
                "/api/admin/subscription/verify",
                json!({
                    "payment_id": "pay_123",
                    "subscription_id": "sub_456",
                    "signature": "00".repeat(32),
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::SignatureInvalid.code());
    }
}
