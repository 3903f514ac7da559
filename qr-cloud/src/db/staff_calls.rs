//! Staff call database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{StaffCall, StaffCallCreate, StaffCallStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::ServiceResult;

const CALL_COLUMNS: &str = "id, table_id, table_name, reason, message, status, \
    acknowledged_by, acknowledged_at, resolved_at, created_at";

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    table_id: i64,
    table_name: &str,
    data: &StaffCallCreate,
) -> Result<StaffCall, BoxError> {
    let message = data
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    let call = sqlx::query_as(&format!(
        "INSERT INTO staff_calls \
            (id, restaurant_id, table_id, table_name, reason, message, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CALL_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(table_id)
    .bind(table_name)
    .bind(data.reason)
    .bind(message)
    .bind(StaffCallStatus::Pending)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(call)
}

pub async fn list(
    pool: &PgPool,
    restaurant_id: i64,
    status: Option<StaffCallStatus>,
) -> Result<Vec<StaffCall>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {CALL_COLUMNS} FROM staff_calls \
         WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY created_at DESC LIMIT 200"
    ))
    .bind(restaurant_id)
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<StaffCall>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {CALL_COLUMNS} FROM staff_calls WHERE restaurant_id = $1 AND id = $2"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Move a call to `next`, conditional on the status it had when read
pub async fn transition(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    next: StaffCallStatus,
    staff_id: i64,
) -> ServiceResult<StaffCall> {
    let current = get(pool, restaurant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StaffCallNotFound))?;
    current.status.check_transition(next)?;

    let now = now_millis();
    let updated: Option<StaffCall> = sqlx::query_as(&format!(
        "UPDATE staff_calls SET \
            status = $1, \
            acknowledged_by = CASE WHEN $1 = 'acknowledged' THEN $2 ELSE acknowledged_by END, \
            acknowledged_at = CASE WHEN $1 = 'acknowledged' THEN $3 ELSE acknowledged_at END, \
            resolved_at = CASE WHEN $1 = 'resolved' THEN $3 ELSE resolved_at END \
         WHERE restaurant_id = $4 AND id = $5 AND status = $6 \
         RETURNING {CALL_COLUMNS}"
    ))
    .bind(next)
    .bind(staff_id)
    .bind(now)
    .bind(restaurant_id)
    .bind(id)
    .bind(current.status)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::StaffCallAlreadyHandled,
            "Staff call was handled by someone else",
        )
        .into()
    })
}

pub async fn pending_count(pool: &PgPool, restaurant_id: i64) -> Result<i64, BoxError> {
    let n = sqlx::query_scalar(
        "SELECT COUNT(*) FROM staff_calls WHERE restaurant_id = $1 AND status = 'pending'",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}
