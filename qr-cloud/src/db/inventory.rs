//! Inventory, order deductions and wastage

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Deduction, InventoryItem, InventoryItemCreate, InventoryItemUpdate, Order, RecipeLine,
    RestockRequest, Wastage, WastageCreate, apply_deduction, plan_usage, wastage_cost,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;
use crate::error::ServiceResult;

const ITEM_COLUMNS: &str =
    "id, name, unit, quantity, low_stock_threshold, cost_per_unit, updated_at";

// ── Stock items ──

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<InventoryItem>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items \
         WHERE restaurant_id = $1 AND deleted_at IS NULL ORDER BY name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<InventoryItem>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items \
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
    data: &InventoryItemCreate,
) -> Result<InventoryItem, BoxError> {
    let now = now_millis();
    let item = sqlx::query_as(&format!(
        "INSERT INTO inventory_items \
            (id, restaurant_id, name, unit, quantity, low_stock_threshold, cost_per_unit, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {ITEM_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(data.unit.trim())
    .bind(data.quantity)
    .bind(data.low_stock_threshold)
    .bind(data.cost_per_unit)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &InventoryItemUpdate,
) -> Result<Option<InventoryItem>, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE inventory_items SET \
            name = COALESCE($1, name), \
            unit = COALESCE($2, unit), \
            low_stock_threshold = COALESCE($3, low_stock_threshold), \
            cost_per_unit = COALESCE($4, cost_per_unit), \
            updated_at = $5 \
         WHERE restaurant_id = $6 AND id = $7 AND deleted_at IS NULL \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.unit.as_deref().map(str::trim))
    .bind(data.low_stock_threshold)
    .bind(data.cost_per_unit)
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn soft_delete(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE inventory_items SET deleted_at = $1, updated_at = $1 \
         WHERE restaurant_id = $2 AND id = $3 AND deleted_at IS NULL",
    )
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn restock(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &RestockRequest,
    recorded_by: i64,
) -> ServiceResult<InventoryItem> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let item: InventoryItem = sqlx::query_as(&format!(
        "UPDATE inventory_items SET quantity = quantity + $1, updated_at = $2 \
         WHERE restaurant_id = $3 AND id = $4 AND deleted_at IS NULL \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(data.quantity)
    .bind(now)
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;

    sqlx::query(
        r#"
        INSERT INTO inventory_restocks (id, restaurant_id, inventory_item_id, quantity, note, recorded_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(id)
    .bind(data.quantity)
    .bind(&data.note)
    .bind(recorded_by)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(item)
}

pub async fn low_stock(pool: &PgPool, restaurant_id: i64) -> Result<Vec<InventoryItem>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items \
         WHERE restaurant_id = $1 AND deleted_at IS NULL AND quantity <= low_stock_threshold \
         ORDER BY quantity - low_stock_threshold, name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn low_stock_count(pool: &PgPool, restaurant_id: i64) -> Result<i64, BoxError> {
    let n = sqlx::query_scalar(
        "SELECT COUNT(*) FROM inventory_items \
         WHERE restaurant_id = $1 AND deleted_at IS NULL AND quantity <= low_stock_threshold",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}

// ── Deductions ──

/// Subtract the recipe usage of `order` from stock, inside the caller's
/// transaction. Running it twice for the same order is a no-op.
pub async fn deduct_for_order(
    conn: &mut PgConnection,
    restaurant_id: i64,
    order: &Order,
) -> Result<Vec<Deduction>, BoxError> {
    let already: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM inventory_deductions WHERE order_id = $1)")
            .bind(order.id)
            .fetch_one(&mut *conn)
            .await?;
    if already {
        return Ok(Vec::new());
    }

    let menu_ids: Vec<i64> = order.items.iter().map(|i| i.menu_item_id).collect();
    let recipes: HashMap<i64, Vec<RecipeLine>> =
        super::menu::recipes(&mut *conn, restaurant_id, &menu_ids)
            .await?
            .into_iter()
            .map(|(id, recipe)| (id, recipe.0))
            .collect();
    let usage = plan_usage(&order.items, |id| recipes.get(&id).map(Vec::as_slice));
    if usage.is_empty() {
        return Ok(Vec::new());
    }

    let now = now_millis();
    let mut deductions = Vec::with_capacity(usage.len());
    for (inventory_item_id, wanted) in usage {
        // Row lock so concurrent orders see each other's deductions
        let row: Option<(String, Decimal)> = sqlx::query_as(
            "SELECT name, quantity FROM inventory_items \
             WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(restaurant_id)
        .bind(inventory_item_id)
        .fetch_optional(&mut *conn)
        .await?;
        let Some((item_name, stock)) = row else {
            tracing::warn!(
                order_id = order.id,
                inventory_item_id,
                "Recipe references a missing inventory item, skipping"
            );
            continue;
        };

        let (new_stock, taken, shortfall) = apply_deduction(stock, wanted);
        if shortfall > Decimal::ZERO {
            tracing::warn!(
                order_id = order.id,
                inventory_item_id,
                %shortfall,
                "Insufficient stock for order"
            );
        }

        sqlx::query("UPDATE inventory_items SET quantity = $1, updated_at = $2 WHERE id = $3")
            .bind(new_stock)
            .bind(now)
            .bind(inventory_item_id)
            .execute(&mut *conn)
            .await?;

        let deduction: Deduction = sqlx::query_as(
            r#"
            INSERT INTO inventory_deductions
                (id, restaurant_id, order_id, inventory_item_id, item_name, quantity, shortfall, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, order_id, inventory_item_id, item_name, quantity, shortfall, created_at
            "#,
        )
        .bind(snowflake_id())
        .bind(restaurant_id)
        .bind(order.id)
        .bind(inventory_item_id)
        .bind(&item_name)
        .bind(taken)
        .bind(shortfall)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        deductions.push(deduction);
    }
    Ok(deductions)
}

pub async fn list_deductions(
    pool: &PgPool,
    restaurant_id: i64,
    order_id: Option<i64>,
) -> Result<Vec<Deduction>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, order_id, inventory_item_id, item_name, quantity, shortfall, created_at
        FROM inventory_deductions
        WHERE restaurant_id = $1 AND ($2::BIGINT IS NULL OR order_id = $2)
        ORDER BY created_at DESC, id
        LIMIT 500
        "#,
    )
    .bind(restaurant_id)
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Wastage ──

pub async fn record_wastage(
    pool: &PgPool,
    restaurant_id: i64,
    data: &WastageCreate,
    recorded_by: i64,
) -> ServiceResult<Wastage> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let row: Option<(String, Decimal, Decimal)> = sqlx::query_as(
        "SELECT name, quantity, cost_per_unit FROM inventory_items \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(restaurant_id)
    .bind(data.inventory_item_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (item_name, stock, cost_per_unit) =
        row.ok_or_else(|| AppError::new(ErrorCode::InventoryItemNotFound))?;

    let (new_stock, _, _) = apply_deduction(stock, data.quantity);
    sqlx::query("UPDATE inventory_items SET quantity = $1, updated_at = $2 WHERE id = $3")
        .bind(new_stock)
        .bind(now)
        .bind(data.inventory_item_id)
        .execute(&mut *tx)
        .await?;

    let wastage = sqlx::query_as(
        r#"
        INSERT INTO wastage
            (id, restaurant_id, inventory_item_id, item_name, quantity, reason, cost, recorded_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, inventory_item_id, item_name, quantity, reason, cost, recorded_by, created_at
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.inventory_item_id)
    .bind(&item_name)
    .bind(data.quantity)
    .bind(data.reason.trim())
    .bind(wastage_cost(data.quantity, cost_per_unit))
    .bind(recorded_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(wastage)
}

pub async fn list_wastage(
    pool: &PgPool,
    restaurant_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<Wastage>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, inventory_item_id, item_name, quantity, reason, cost, recorded_by, created_at
        FROM wastage
        WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3
        ORDER BY created_at DESC
        "#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
