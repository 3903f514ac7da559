//! Payment ledger (order settlements and subscription charges)

use rust_decimal::Decimal;
use shared::models::{Payment, PaymentKind, PaymentMethod};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;

const PAYMENT_COLUMNS: &str =
    "id, kind, order_id, subscription_id, method, amount, reference, recorded_by, created_at";

pub struct NewPayment<'a> {
    pub kind: PaymentKind,
    pub order_id: Option<i64>,
    pub subscription_id: Option<i64>,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<&'a str>,
    pub recorded_by: Option<i64>,
}

pub async fn insert(
    conn: &mut PgConnection,
    restaurant_id: i64,
    data: &NewPayment<'_>,
) -> Result<Payment, BoxError> {
    let payment = sqlx::query_as(&format!(
        "INSERT INTO payments \
            (id, restaurant_id, kind, order_id, subscription_id, method, amount, reference, recorded_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.kind)
    .bind(data.order_id)
    .bind(data.subscription_id)
    .bind(data.method)
    .bind(data.amount)
    .bind(data.reference)
    .bind(data.recorded_by)
    .bind(now_millis())
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Subscription payments are keyed by the gateway payment id; a repeat is ignored.
pub async fn insert_subscription_payment(
    conn: &mut PgConnection,
    restaurant_id: i64,
    subscription_id: i64,
    amount: Decimal,
    gateway_payment_id: &str,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        INSERT INTO payments
            (id, restaurant_id, kind, subscription_id, method, amount, reference, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (reference) WHERE kind = 'subscription' AND reference IS NOT NULL DO NOTHING
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(PaymentKind::Subscription)
    .bind(subscription_id)
    .bind(PaymentMethod::Online)
    .bind(amount)
    .bind(gateway_payment_id)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(
    pool: &PgPool,
    restaurant_id: i64,
    kind: Option<PaymentKind>,
) -> Result<Vec<Payment>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR kind = $2) \
         ORDER BY created_at DESC LIMIT 500"
    ))
    .bind(restaurant_id)
    .bind(kind)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
