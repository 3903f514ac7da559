//! Menu item database operations

use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;
use sqlx::types::Json;

use super::BoxError;

const MENU_COLUMNS: &str =
    "id, name, description, category, price, image_url, is_available, is_veg, zone_ids, recipe";

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<MenuItem>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {MENU_COLUMNS} FROM menu_items \
         WHERE restaurant_id = $1 AND deleted_at IS NULL \
         ORDER BY category NULLS LAST, name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Items currently orderable; zone filtering happens in `visible_menu`
pub async fn list_available(pool: &PgPool, restaurant_id: i64) -> Result<Vec<MenuItem>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {MENU_COLUMNS} FROM menu_items \
         WHERE restaurant_id = $1 AND deleted_at IS NULL AND is_available \
         ORDER BY category NULLS LAST, name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<MenuItem>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {MENU_COLUMNS} FROM menu_items \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &MenuItemCreate,
) -> Result<MenuItem, BoxError> {
    let now = now_millis();
    let item = sqlx::query_as(&format!(
        "INSERT INTO menu_items \
            (id, restaurant_id, name, description, category, price, image_url, \
             is_available, is_veg, zone_ids, recipe, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
         RETURNING {MENU_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(&data.category)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.is_veg)
    .bind(&data.zone_ids)
    .bind(Json(&data.recipe))
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &MenuItemUpdate,
) -> Result<Option<MenuItem>, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE menu_items SET \
            name = COALESCE($1, name), \
            description = COALESCE($2, description), \
            category = COALESCE($3, category), \
            price = COALESCE($4, price), \
            image_url = COALESCE($5, image_url), \
            is_available = COALESCE($6, is_available), \
            is_veg = COALESCE($7, is_veg), \
            zone_ids = COALESCE($8, zone_ids), \
            recipe = COALESCE($9, recipe), \
            updated_at = $10 \
         WHERE restaurant_id = $11 AND id = $12 AND deleted_at IS NULL \
         RETURNING {MENU_COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(&data.category)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.is_veg)
    .bind(&data.zone_ids)
    .bind(data.recipe.as_ref().map(Json))
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn set_availability(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    is_available: bool,
) -> Result<Option<MenuItem>, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE menu_items SET is_available = $1, updated_at = $2 \
         WHERE restaurant_id = $3 AND id = $4 AND deleted_at IS NULL \
         RETURNING {MENU_COLUMNS}"
    ))
    .bind(is_available)
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
        UPDATE menu_items SET deleted_at = $1, updated_at = $1
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

/// Recipes for the given menu items, deleted ones included
pub async fn recipes(
    conn: &mut sqlx::PgConnection,
    restaurant_id: i64,
    ids: &[i64],
) -> Result<Vec<(i64, Json<Vec<shared::models::RecipeLine>>)>, BoxError> {
    let rows = sqlx::query_as(
        "SELECT id, recipe FROM menu_items WHERE restaurant_id = $1 AND id = ANY($2)",
    )
    .bind(restaurant_id)
    .bind(ids)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
