//! Customer database operations

use rust_decimal::Decimal;
use shared::models::{Customer, Order};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, visit_count, total_spent, last_visit_at, created_at";
const MAX_LIST: i64 = 200;

/// Find-or-create by phone. A non-empty name replaces the stored one.
pub async fn upsert(
    conn: &mut PgConnection,
    restaurant_id: i64,
    phone: &str,
    name: Option<&str>,
) -> Result<Customer, BoxError> {
    let now = now_millis();
    let customer = sqlx::query_as(&format!(
        "INSERT INTO customers (id, restaurant_id, name, phone, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $5) \
         ON CONFLICT (restaurant_id, phone) DO UPDATE SET \
            name = COALESCE(EXCLUDED.name, customers.name), \
            updated_at = EXCLUDED.updated_at \
         RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(name)
    .bind(phone)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(customer)
}

pub async fn list(
    pool: &PgPool,
    restaurant_id: i64,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<Customer>, BoxError> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")));
    let rows = sqlx::query_as(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers \
         WHERE restaurant_id = $1 \
           AND ($2::TEXT IS NULL OR name ILIKE $2 OR phone LIKE $2) \
         ORDER BY last_visit_at DESC NULLS LAST, created_at DESC \
         LIMIT $3"
    ))
    .bind(restaurant_id)
    .bind(pattern)
    .bind(limit.clamp(1, MAX_LIST))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<Customer>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE restaurant_id = $1 AND id = $2"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Count a paid visit
pub async fn record_visit(
    conn: &mut PgConnection,
    customer_id: i64,
    amount: Decimal,
) -> Result<(), BoxError> {
    let now = now_millis();
    sqlx::query(
        r#"
        UPDATE customers SET
            visit_count = visit_count + 1,
            total_spent = total_spent + $1,
            last_visit_at = $2,
            updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(amount)
    .bind(now)
    .bind(customer_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn recent_orders(
    pool: &PgPool,
    restaurant_id: i64,
    customer_id: i64,
    limit: i64,
) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {} FROM orders \
         WHERE restaurant_id = $1 AND customer_id = $2 AND deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT $3",
        super::orders::ORDER_COLUMNS
    ))
    .bind(restaurant_id)
    .bind(customer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
