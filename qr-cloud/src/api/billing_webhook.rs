//! Payment gateway webhook
//!
//! POST /api/billing/webhook (raw body for signature verification)

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use sha2::{Digest, Sha256};
use shared::models::{SubscriptionStatus, status_for_event};
use sqlx::PgConnection;

use crate::db::{self, BoxError};
use crate::gateway::minor_units;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-razorpay-signature";
const EVENT_ID_HEADER: &str = "x-razorpay-event-id";

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::warn!("Missing webhook signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(e) = state.gateway.verify_webhook_signature(&body, signature) {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };
    let event_type = event["event"].as_str().unwrap_or("");
    let event_id = event_id(&headers, &body);
    tracing::info!(event_type, event_id = %event_id, "Received gateway webhook");

    match process(&state, &event_id, event_type, &event).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            // Rolled back, including the idempotency record, so the gateway retry is processed
            tracing::error!(event_type, error = %e, "Webhook processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Gateway delivery id, or the body hash when the header is absent
fn event_id(headers: &HeaderMap, body: &[u8]) -> String {
    headers
        .get(EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("sha256:{}", hex::encode(Sha256::digest(body))))
}

async fn process(
    state: &AppState,
    event_id: &str,
    event_type: &str,
    event: &serde_json::Value,
) -> Result<(), BoxError> {
    let mut tx = state.pool.begin().await?;

    // Idempotency: INSERT first, check rows_affected
    if !db::subscriptions::record_event(&mut tx, event_id, event_type).await? {
        tracing::info!(event_id, "Duplicate webhook event, skipping");
        return Ok(());
    }

    match event_type {
        t if t.starts_with("subscription.") => {
            handle_subscription_event(&mut tx, event_type, event).await?;
        }
        "payment.failed" => {
            let payment = &event["payload"]["payment"]["entity"];
            tracing::warn!(
                payment_id = payment["id"].as_str().unwrap_or(""),
                reason = payment["error_description"].as_str().unwrap_or(""),
                "Gateway payment failed"
            );
        }
        _ => tracing::debug!(event_type, "Unhandled webhook event type"),
    }

    tx.commit().await?;
    Ok(())
}

async fn handle_subscription_event(
    conn: &mut PgConnection,
    event_type: &str,
    event: &serde_json::Value,
) -> Result<(), BoxError> {
    let action = event_type.trim_start_matches("subscription.");
    let Some(status) = status_for_event(action) else {
        tracing::debug!(event_type, "Subscription event without status change");
        return Ok(());
    };

    let entity = &event["payload"]["subscription"]["entity"];
    let Some(gateway_id) = entity["id"].as_str() else {
        tracing::warn!(event_type, "Subscription event missing subscription id");
        return Ok(());
    };

    let Some(owned) = db::subscriptions::find_by_gateway_id(conn, gateway_id).await? else {
        tracing::warn!(gateway_subscription_id = gateway_id, "No subscription for webhook");
        return Ok(());
    };

    let period_end = entity["current_end"].as_i64().map(|secs| secs * 1000);
    let updated =
        db::subscriptions::update_status(conn, owned.subscription.id, status, period_end).await?;
    tracing::info!(
        restaurant_id = owned.restaurant_id,
        subscription_id = updated.id,
        status = %updated.status,
        "Subscription updated from webhook"
    );

    if event_type == "subscription.charged" && status == SubscriptionStatus::Active {
        let payment = &event["payload"]["payment"]["entity"];
        if let (Some(payment_id), Some(amount)) = (payment["id"].as_str(), payment["amount"].as_i64()) {
            let inserted = db::payments::insert_subscription_payment(
                conn,
                owned.restaurant_id,
                updated.id,
                minor_units(amount),
                payment_id,
            )
            .await?;
            if !inserted {
                tracing::debug!(payment_id, "Subscription payment already recorded");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::Request;

    use super::*;
    use crate::api::test_support::{send, state};
    use crate::gateway::sign;

    fn webhook(body: &'static str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::post("/api/billing/webhook");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_missing_signature() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(state(dir.path()), webhook("{}", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_signature() {
        let dir = tempfile::tempdir().unwrap();
        let sig = sign("wrong-secret", b"{}");
        let (status, _) = send(state(dir.path()), webhook("{}", Some(sig))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signed_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sig = sign("test-webhook-secret", b"not json");
        let (status, _) = send(state(dir.path()), webhook("not json", Some(sig))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_event_id_prefers_header() {
        let mut headers = HeaderMap::new();
        let from_body = event_id(&headers, b"{}");
        assert!(from_body.starts_with("sha256:"));
        assert_eq!(from_body, event_id(&headers, b"{}"));
        assert_ne!(from_body, event_id(&headers, b"{ }"));

        headers.insert(EVENT_ID_HEADER, "evt_123".parse().unwrap());
        assert_eq!(event_id(&headers, b"{}"), "evt_123");
    }
}
