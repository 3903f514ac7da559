//! Order database operations
//!
//! Status changes are conditional updates on the status the caller saw, so two
//! staff members racing on the same order cannot both win. Inventory is
//! deducted in the same transaction that moves an order into `preparing`.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderItem, OrderQuery, OrderStatus, OrderTotals, Payment, PaymentKind, PaymentStatus,
    RecordPayment, check_amount,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;
use sqlx::types::Json;

use super::BoxError;
use super::payments::NewPayment;
use crate::error::ServiceResult;

pub(crate) const ORDER_COLUMNS: &str = "id, table_id, table_name, zone_id, customer_id, \
    customer_name, status, payment_status, items, subtotal, tax, total, notes, created_at, updated_at";

pub struct NewOrder<'a> {
    pub table_id: i64,
    pub table_name: &'a str,
    pub zone_id: Option<i64>,
    /// Normalized phone and optional name
    pub customer: Option<(&'a str, Option<&'a str>)>,
    pub items: &'a [OrderItem],
    pub totals: OrderTotals,
    pub notes: Option<&'a str>,
}

pub async fn insert(pool: &PgPool, restaurant_id: i64, data: &NewOrder<'_>) -> ServiceResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let customer = match data.customer {
        Some((phone, name)) => Some(super::customers::upsert(&mut tx, restaurant_id, phone, name).await?),
        None => None,
    };
    let customer_name = customer
        .as_ref()
        .and_then(|c| c.name.clone())
        .or_else(|| data.customer.and_then(|(_, name)| name.map(String::from)));

    let order = sqlx::query_as(&format!(
        "INSERT INTO orders \
            (id, restaurant_id, table_id, table_name, zone_id, customer_id, customer_name, \
             status, payment_status, items, subtotal, tax, total, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.table_id)
    .bind(data.table_name)
    .bind(data.zone_id)
    .bind(customer.as_ref().map(|c| c.id))
    .bind(customer_name)
    .bind(OrderStatus::Pending)
    .bind(PaymentStatus::Unpaid)
    .bind(Json(data.items))
    .bind(data.totals.subtotal)
    .bind(data.totals.tax)
    .bind(data.totals.total)
    .bind(data.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<Order>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Order as seen from a table session: other tables' orders do not exist
pub async fn get_for_table(
    pool: &PgPool,
    restaurant_id: i64,
    table_id: i64,
    id: i64,
) -> Result<Option<Order>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND table_id = $2 AND id = $3 AND deleted_at IS NULL"
    ))
    .bind(restaurant_id)
    .bind(table_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list(pool: &PgPool, restaurant_id: i64, query: &OrderQuery) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND deleted_at IS NULL \
           AND ($2::TEXT IS NULL OR status = $2) \
           AND ($3::BIGINT IS NULL OR table_id = $3) \
           AND (NOT $4 OR status NOT IN ('completed', 'cancelled')) \
         ORDER BY created_at DESC \
         LIMIT $5 OFFSET $6"
    ))
    .bind(restaurant_id)
    .bind(query.status)
    .bind(query.table_id)
    .bind(query.active_only)
    .bind(query.limit())
    .bind(query.offset())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Orders created in `[from, to)`
pub async fn list_range(
    pool: &PgPool,
    restaurant_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND deleted_at IS NULL \
           AND created_at >= $2 AND created_at < $3 \
         ORDER BY created_at"
    ))
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_status(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    next: OrderStatus,
) -> ServiceResult<Order> {
    let current = get(pool, restaurant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    current.status.check_transition(next)?;

    let mut tx = pool.begin().await?;
    let updated: Option<Order> = sqlx::query_as(&format!(
        "UPDATE orders SET status = $1, updated_at = $2 \
         WHERE restaurant_id = $3 AND id = $4 AND status = $5 AND deleted_at IS NULL \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(next)
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .bind(current.status)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(order) = updated else {
        return Err(AppError::with_message(
            ErrorCode::OrderStatusConflict,
            "Order was changed by someone else, reload and retry",
        )
        .with_detail("expected", current.status.as_str())
        .into());
    };

    if next == OrderStatus::Preparing {
        let deductions = super::inventory::deduct_for_order(&mut tx, restaurant_id, &order).await?;
        tracing::debug!(order_id = id, lines = deductions.len(), "Inventory deducted");
    }

    tx.commit().await?;
    Ok(order)
}

/// Settle an order in full
pub async fn record_payment(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    data: &RecordPayment,
    recorded_by: i64,
) -> ServiceResult<(Order, Payment)> {
    let mut tx = pool.begin().await?;

    let order: Order = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL FOR UPDATE"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.status == OrderStatus::Cancelled {
        return Err(AppError::new(ErrorCode::OrderCancelled).into());
    }
    if order.payment_status == PaymentStatus::Paid {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid).into());
    }
    check_amount(data.amount, order.total)?;

    let payment = super::payments::insert(
        &mut tx,
        restaurant_id,
        &NewPayment {
            kind: PaymentKind::Order,
            order_id: Some(order.id),
            subscription_id: None,
            method: data.method,
            amount: data.amount,
            reference: data.reference.as_deref(),
            recorded_by: Some(recorded_by),
        },
    )
    .await?;

    let order: Order = sqlx::query_as(&format!(
        "UPDATE orders SET payment_status = $1, updated_at = $2 WHERE id = $3 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(PaymentStatus::Paid)
    .bind(now_millis())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(customer_id) = order.customer_id {
        super::customers::record_visit(&mut tx, customer_id, order.total).await?;
    }

    tx.commit().await?;
    Ok((order, payment))
}
