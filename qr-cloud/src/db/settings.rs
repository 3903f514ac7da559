//! Per-restaurant key/value settings

use shared::models::Setting;
use shared::util::now_millis;
use sqlx::PgPool;

use super::BoxError;

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<Setting>, BoxError> {
    let rows = sqlx::query_as(
        "SELECT key, value, updated_at FROM settings WHERE restaurant_id = $1 ORDER BY key",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn upsert(
    pool: &PgPool,
    restaurant_id: i64,
    key: &str,
    value: &serde_json::Value,
) -> Result<Setting, BoxError> {
    let row = sqlx::query_as(
        r#"
        INSERT INTO settings (restaurant_id, key, value, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (restaurant_id, key)
        DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
        RETURNING key, value, updated_at
        "#,
    )
    .bind(restaurant_id)
    .bind(key)
    .bind(sqlx::types::Json(value))
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns `false` when the key did not exist
pub async fn delete(pool: &PgPool, restaurant_id: i64, key: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM settings WHERE restaurant_id = $1 AND key = $2")
        .bind(restaurant_id)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
