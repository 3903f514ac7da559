//! Staff calls and zone change requests raised from tables

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LiveEvent, StaffCall, StaffCallQuery, StaffCallStatus, ZoneRequest, ZoneRequestApproval,
    ZoneRequestQuery,
};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

pub async fn list_staff_calls(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<StaffCallQuery>,
) -> ApiResult<Vec<StaffCall>> {
    let calls = db::staff_calls::list(&state.pool, identity.restaurant_id, query.status)
        .await
        .map_err(internal)?;
    Ok(Json(calls))
}

pub async fn acknowledge_staff_call(
    state: State<AppState>,
    identity: Extension<StaffIdentity>,
    id: Path<i64>,
) -> ApiResult<StaffCall> {
    move_staff_call(state, identity, id, StaffCallStatus::Acknowledged).await
}

pub async fn resolve_staff_call(
    state: State<AppState>,
    identity: Extension<StaffIdentity>,
    id: Path<i64>,
) -> ApiResult<StaffCall> {
    move_staff_call(state, identity, id, StaffCallStatus::Resolved).await
}

async fn move_staff_call(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    next: StaffCallStatus,
) -> ApiResult<StaffCall> {
    let call = db::staff_calls::transition(
        &state.pool,
        identity.restaurant_id,
        id,
        next,
        identity.staff_id,
    )
    .await?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        staff_call_id = id,
        status = %call.status,
        staff_id = identity.staff_id,
        "Staff call updated"
    );
    state
        .live
        .publish(identity.restaurant_id, LiveEvent::StaffCallUpdated(call.clone()));
    Ok(Json(call))
}

pub async fn list_zone_requests(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(query): Query<ZoneRequestQuery>,
) -> ApiResult<Vec<ZoneRequest>> {
    let requests = db::zone_requests::list(&state.pool, identity.restaurant_id, query.status)
        .await
        .map_err(internal)?;
    Ok(Json(requests))
}

pub async fn get_zone_request(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ZoneRequest> {
    let request = db::zone_requests::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ZoneRequestNotFound))?;
    Ok(Json(request))
}

/// POST /api/admin/zone-requests/{id}/approve
///
/// The body is optional; without a target table the requesting table itself
/// moves to the requested zone.
pub async fn approve_zone_request(
    state: State<AppState>,
    identity: Extension<StaffIdentity>,
    id: Path<i64>,
    body: Bytes,
) -> ApiResult<ZoneRequest> {
    let approval: ZoneRequestApproval = if body.iter().all(u8::is_ascii_whitespace) {
        ZoneRequestApproval::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            AppError::invalid_request(format!("Invalid body: {e}"))
        })?
    };
    decide(state, identity, id, true, approval.target_table_id).await
}

pub async fn reject_zone_request(
    state: State<AppState>,
    identity: Extension<StaffIdentity>,
    id: Path<i64>,
) -> ApiResult<ZoneRequest> {
    decide(state, identity, id, false, None).await
}

async fn decide(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    approve: bool,
    target_table_id: Option<i64>,
) -> ApiResult<ZoneRequest> {
    require_manager(&identity)?;
    let request = db::zone_requests::decide(
        &state.pool,
        identity.restaurant_id,
        id,
        approve,
        target_table_id,
        identity.staff_id,
    )
    .await?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        zone_request_id = id,
        status = %request.status,
        target_table_id = ?request.target_table_id,
        decided_by = identity.staff_id,
        "Zone request decided"
    );
    state
        .live
        .publish(identity.restaurant_id, LiveEvent::ZoneRequestUpdated(request.clone()));
    Ok(Json(request))
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
    async fn test_waiter_cannot_decide_zone_request() {
        let dir = tempfile::tempdir().unwrap();
        let token = create_token(10, 1, StaffRole::Waiter, "test-jwt-secret").unwrap();
        let request = Request::post("/api/admin/zone-requests/3/reject")
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state(dir.path()), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::ManagerRequired.code());
    }
}
