//! Staff calls and zone change requests from a table

use axum::{Json, extract::State};
use shared::models::{LiveEvent, StaffCall, StaffCallCreate, ZoneRequest, ZoneRequestCreate};

use crate::api::{ApiResult, internal};
use crate::auth::TableSession;
use crate::db;
use crate::state::AppState;

use super::session_table;

/// POST /api/public/staff-calls
pub async fn create_staff_call(
    State(state): State<AppState>,
    session: TableSession,
    Json(data): Json<StaffCallCreate>,
) -> ApiResult<StaffCall> {
    data.validate()?;
    let table = session_table(&state, &session).await?;

    let call = db::staff_calls::create(&state.pool, session.restaurant_id, table.id, &table.name, &data)
        .await
        .map_err(internal)?;

    tracing::info!(
        restaurant_id = session.restaurant_id,
        table_id = table.id,
        reason = %call.reason,
        "Staff called"
    );
    state
        .live
        .publish(session.restaurant_id, LiveEvent::StaffCallCreated(call.clone()));
    Ok(Json(call))
}

/// POST /api/public/zone-requests
pub async fn create_zone_request(
    State(state): State<AppState>,
    session: TableSession,
    Json(data): Json<ZoneRequestCreate>,
) -> ApiResult<ZoneRequest> {
    let table = session_table(&state, &session).await?;

    let request = db::zone_requests::create(
        &state.pool,
        session.restaurant_id,
        &db::zone_requests::RequestingTable {
            id: table.id,
            name: &table.name,
            zone_id: table.zone_id,
        },
        &data,
    )
    .await?;

    tracing::info!(
        restaurant_id = session.restaurant_id,
        table_id = table.id,
        requested_zone_id = request.requested_zone_id,
        "Zone change requested"
    );
    state
        .live
        .publish(session.restaurant_id, LiveEvent::ZoneRequestCreated(request.clone()));
    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{send, state};
    use crate::auth::session::SESSION_HEADER;
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn test_long_staff_call_message_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let (token, _) = st
            .sessions
            .issue(1, 2, chrono::Utc::now().timestamp())
            .unwrap();
        let request = http::Request::post("/api/public/staff-calls")
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, token)
            .body(axum::body::Body::from(
                json!({"reason": "water", "message": "x".repeat(501)}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(st, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::ValueOutOfRange.code());
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_still_rate_limited() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let call = |n: u32| {
            http::Request::post("/api/public/staff-calls")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", format!("203.0.113.{n}"))
                .body(axum::body::Body::from(json!({"reason": "water"}).to_string()))
                .unwrap()
        };
        for n in 0..30 {
            let (status, _) = send(st.clone(), call(n)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, body) = send(st, call(200)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], ErrorCode::TooManyRequests.code());
    }

    #[tokio::test]
    async fn test_unknown_reason_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let (token, _) = st
            .sessions
            .issue(1, 2, chrono::Utc::now().timestamp())
            .unwrap();
        let request = http::Request::post("/api/public/staff-calls")
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, token)
            .body(axum::body::Body::from(json!({"reason": "dance"}).to_string()))
            .unwrap();
        let (status, _) = send(st, request).await;
        assert!(status.is_client_error());
    }
}
