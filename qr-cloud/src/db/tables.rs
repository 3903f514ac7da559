//! Dining table database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, generate_qr_token};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::ServiceResult;

const TABLE_COLUMNS: &str = "id, name, zone_id, capacity, qr_token, is_active";

/// Table looked up from a scanned QR token, with its owning restaurant
#[derive(Debug, sqlx::FromRow)]
pub struct ScannedTable {
    pub restaurant_id: i64,
    pub id: i64,
    pub name: String,
    pub zone_id: Option<i64>,
    pub is_active: bool,
}

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<DiningTable>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {TABLE_COLUMNS} FROM dining_tables \
         WHERE restaurant_id = $1 AND deleted_at IS NULL ORDER BY name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<DiningTable>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {TABLE_COLUMNS} FROM dining_tables \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_qr_token(pool: &PgPool, token: &str) -> Result<Option<ScannedTable>, BoxError> {
    let row = sqlx::query_as(
        r#"
        SELECT t.restaurant_id, t.id, t.name, t.zone_id, t.is_active
        FROM dining_tables t
        JOIN restaurants r ON r.id = t.restaurant_id AND r.deleted_at IS NULL
        WHERE t.qr_token = $1 AND t.deleted_at IS NULL
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn check_zone(pool: &PgPool, restaurant_id: i64, zone_id: Option<i64>) -> ServiceResult<()> {
    let Some(zone_id) = zone_id else {
        return Ok(());
    };
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM zones WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL)",
    )
    .bind(restaurant_id)
    .bind(zone_id)
    .fetch_one(pool)
    .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::ZoneNotFound)
            .with_detail("zone_id", zone_id)
            .into());
    }
    Ok(())
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &DiningTableCreate,
) -> ServiceResult<DiningTable> {
    check_zone(pool, restaurant_id, data.zone_id).await?;
    let now = now_millis();
    let table = sqlx::query_as(&format!(
        "INSERT INTO dining_tables \
            (id, restaurant_id, name, zone_id, capacity, qr_token, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7) RETURNING {TABLE_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(data.zone_id)
    .bind(data.capacity_or_default())
    .bind(generate_qr_token())
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(table)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &DiningTableUpdate,
) -> ServiceResult<Option<DiningTable>> {
    check_zone(pool, restaurant_id, data.zone_id).await?;
    let row = sqlx::query_as(&format!(
        "UPDATE dining_tables SET \
            name = COALESCE($1, name), \
            zone_id = COALESCE($2, zone_id), \
            capacity = COALESCE($3, capacity), \
            is_active = COALESCE($4, is_active), \
            updated_at = $5 \
         WHERE restaurant_id = $6 AND id = $7 AND deleted_at IS NULL \
         RETURNING {TABLE_COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.zone_id)
    .bind(data.capacity)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn soft_delete(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE dining_tables SET deleted_at = $1, is_active = FALSE, updated_at = $1
        WHERE restaurant_id = $2 AND id = $3 AND deleted_at IS NULL
        "#,
    )
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Rotate the QR token; previously printed codes stop working
pub async fn regenerate_qr(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
) -> Result<Option<DiningTable>, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE dining_tables SET qr_token = $1, updated_at = $2 \
         WHERE restaurant_id = $3 AND id = $4 AND deleted_at IS NULL \
         RETURNING {TABLE_COLUMNS}"
    ))
    .bind(generate_qr_token())
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn count(pool: &PgPool, restaurant_id: i64) -> Result<i64, BoxError> {
    let n = sqlx::query_scalar(
        "SELECT COUNT(*) FROM dining_tables WHERE restaurant_id = $1 AND deleted_at IS NULL",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}
