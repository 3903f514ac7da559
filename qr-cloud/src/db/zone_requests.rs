//! Zone change requests raised from a table

use shared::error::{AppError, ErrorCode};
use shared::models::{ZoneRequest, ZoneRequestCreate, ZoneRequestStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::ServiceResult;

const REQUEST_COLUMNS: &str = "id, table_id, table_name, current_zone_id, requested_zone_id, \
    reason, status, target_table_id, decided_by, decided_at, created_at";

pub struct RequestingTable<'a> {
    pub id: i64,
    pub name: &'a str,
    pub zone_id: Option<i64>,
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    table: &RequestingTable<'_>,
    data: &ZoneRequestCreate,
) -> ServiceResult<ZoneRequest> {
    data.validate_against(table.zone_id)?;
    let zone_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM zones \
         WHERE restaurant_id = $1 AND id = $2 AND is_active AND deleted_at IS NULL)",
    )
    .bind(restaurant_id)
    .bind(data.requested_zone_id)
    .fetch_one(pool)
    .await?;
    if !zone_exists {
        return Err(AppError::with_message(ErrorCode::ZoneNotFound, "Requested zone does not exist")
            .with_detail("zone_id", data.requested_zone_id)
            .into());
    }

    let reason = data.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let request = sqlx::query_as(&format!(
        "INSERT INTO zone_requests \
            (id, restaurant_id, table_id, table_name, current_zone_id, requested_zone_id, reason, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(table.id)
    .bind(table.name)
    .bind(table.zone_id)
    .bind(data.requested_zone_id)
    .bind(reason)
    .bind(ZoneRequestStatus::Pending)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(request)
}

pub async fn list(
    pool: &PgPool,
    restaurant_id: i64,
    status: Option<ZoneRequestStatus>,
) -> Result<Vec<ZoneRequest>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {REQUEST_COLUMNS} FROM zone_requests \
         WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY created_at DESC LIMIT 200"
    ))
    .bind(restaurant_id)
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<ZoneRequest>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {REQUEST_COLUMNS} FROM zone_requests WHERE restaurant_id = $1 AND id = $2"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Approve or reject a pending request.
///
/// On approval without a target table the requesting table moves into the
/// requested zone. With a target table the guests are seated there instead,
/// so the target must be an active table of the requested zone.
pub async fn decide(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    approve: bool,
    target_table_id: Option<i64>,
    decided_by: i64,
) -> ServiceResult<ZoneRequest> {
    let mut tx = pool.begin().await?;

    let request: ZoneRequest = sqlx::query_as(&format!(
        "SELECT {REQUEST_COLUMNS} FROM zone_requests \
         WHERE restaurant_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ZoneRequestNotFound))?;
    request.status.check_decidable()?;

    let now = now_millis();
    if approve {
        match target_table_id {
            Some(target) => {
                let target_zone: Option<(Option<i64>, bool)> = sqlx::query_as(
                    "SELECT zone_id, is_active FROM dining_tables \
                     WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL",
                )
                .bind(restaurant_id)
                .bind(target)
                .fetch_optional(&mut *tx)
                .await?;
                match target_zone {
                    None => return Err(AppError::new(ErrorCode::TableNotFound).into()),
                    Some((_, false)) => return Err(AppError::new(ErrorCode::TableInactive).into()),
                    Some((zone, true)) if zone != Some(request.requested_zone_id) => {
                        return Err(AppError::new(ErrorCode::TableNotInZone)
                            .with_detail("table_id", target)
                            .with_detail("zone_id", request.requested_zone_id)
                            .into());
                    }
                    Some(_) => {}
                }
            }
            None => {
                sqlx::query(
                    "UPDATE dining_tables SET zone_id = $1, updated_at = $2 \
                     WHERE restaurant_id = $3 AND id = $4 AND deleted_at IS NULL",
                )
                .bind(request.requested_zone_id)
                .bind(now)
                .bind(restaurant_id)
                .bind(request.table_id)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    let status = if approve {
        ZoneRequestStatus::Approved
    } else {
        ZoneRequestStatus::Rejected
    };
    let decided = sqlx::query_as(&format!(
        "UPDATE zone_requests SET status = $1, target_table_id = $2, decided_by = $3, decided_at = $4 \
         WHERE id = $5 RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(status)
    .bind(if approve { target_table_id } else { None })
    .bind(decided_by)
    .bind(now)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(decided)
}
