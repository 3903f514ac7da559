//! Zone database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Zone, ZoneCreate, ZoneUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceError, ServiceResult, is_unique_violation};

fn name_conflict(e: sqlx::Error) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::new(ErrorCode::ZoneNameExists).into()
    } else {
        e.into()
    }
}

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<Zone>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, name, description, is_active
        FROM zones
        WHERE restaurant_id = $1 AND deleted_at IS NULL
        ORDER BY name
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<Zone>, BoxError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, name, description, is_active
        FROM zones
        WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, restaurant_id: i64, data: &ZoneCreate) -> ServiceResult<Zone> {
    let now = now_millis();
    let zone = sqlx::query_as(
        r#"
        INSERT INTO zones (id, restaurant_id, name, description, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, TRUE, $5, $5)
        RETURNING id, name, description, is_active
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(name_conflict)?;
    Ok(zone)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &ZoneUpdate,
) -> ServiceResult<Option<Zone>> {
    let zone = sqlx::query_as(
        r#"
        UPDATE zones SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            is_active = COALESCE($3, is_active),
            updated_at = $4
        WHERE restaurant_id = $5 AND id = $6 AND deleted_at IS NULL
        RETURNING id, name, description, is_active
        "#,
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(name_conflict)?;
    Ok(zone)
}

/// Soft delete. Refused while live tables still sit in the zone.
pub async fn soft_delete(pool: &PgPool, restaurant_id: i64, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM zones
            WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL
            FOR UPDATE
        )
        "#,
    )
    .bind(restaurant_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::ZoneNotFound).into());
    }

    let table_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM dining_tables
        WHERE restaurant_id = $1 AND zone_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(restaurant_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if table_count > 0 {
        return Err(AppError::new(ErrorCode::ZoneHasTables)
            .with_detail("table_count", table_count)
            .into());
    }

    sqlx::query("UPDATE zones SET deleted_at = $1, updated_at = $1 WHERE id = $2")
        .bind(now_millis())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
