//! Subscription records and gateway webhook bookkeeping

use shared::models::{Plan, Subscription, SubscriptionStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;

const SUBSCRIPTION_COLUMNS: &str =
    "id, plan, status, gateway_subscription_id, current_period_end, created_at, updated_at";

/// Subscription together with the restaurant that owns it
#[derive(Debug, sqlx::FromRow)]
pub struct OwnedSubscription {
    pub restaurant_id: i64,
    #[sqlx(flatten)]
    pub subscription: Subscription,
}

pub async fn latest(pool: &PgPool, restaurant_id: i64) -> Result<Option<Subscription>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
         WHERE restaurant_id = $1 \
         ORDER BY \
            CASE WHEN status IN ('active', 'authenticated') THEN 0 ELSE 1 END, \
            created_at DESC \
         LIMIT 1"
    ))
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    plan: Plan,
    gateway_subscription_id: &str,
) -> Result<Subscription, BoxError> {
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        "INSERT INTO subscriptions \
            (id, restaurant_id, plan, status, gateway_subscription_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {SUBSCRIPTION_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(plan)
    .bind(SubscriptionStatus::Created)
    .bind(gateway_subscription_id)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_gateway_id(
    conn: &mut PgConnection,
    gateway_subscription_id: &str,
) -> Result<Option<OwnedSubscription>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT restaurant_id, {SUBSCRIPTION_COLUMNS} FROM subscriptions \
         WHERE gateway_subscription_id = $1 FOR UPDATE"
    ))
    .bind(gateway_subscription_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Set the status; a given period end replaces the stored one
pub async fn update_status(
    conn: &mut PgConnection,
    id: i64,
    status: SubscriptionStatus,
    current_period_end: Option<i64>,
) -> Result<Subscription, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE subscriptions SET \
            status = $1, \
            current_period_end = COALESCE($2, current_period_end), \
            updated_at = $3 \
         WHERE id = $4 RETURNING {SUBSCRIPTION_COLUMNS}"
    ))
    .bind(status)
    .bind(current_period_end)
    .bind(now_millis())
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Record a webhook delivery. Returns `false` when it was already processed.
pub async fn record_event(
    conn: &mut PgConnection,
    event_id: &str,
    event_type: &str,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at) \
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
