//! Plan quota checks for tables and staff accounts

use shared::models::{Plan, QuotaResource, effective_plan};
use sqlx::PgPool;

use crate::db::{self, BoxError};
use crate::error::ServiceResult;

/// Plan in effect for a restaurant: its latest subscription if that grants a plan, else free
pub async fn current_plan(pool: &PgPool, restaurant_id: i64) -> Result<Plan, BoxError> {
    let latest = db::subscriptions::latest(pool, restaurant_id).await?;
    Ok(effective_plan(latest.as_ref()))
}

/// Fails with `PlanLimitReached` when creating one more `resource` would exceed the plan
pub async fn enforce(pool: &PgPool, restaurant_id: i64, resource: QuotaResource) -> ServiceResult<()> {
    let plan = current_plan(pool, restaurant_id).await?;
    let current = match resource {
        QuotaResource::Tables => db::tables::count(pool, restaurant_id).await?,
        QuotaResource::Staff => db::staff::count(pool, restaurant_id).await?,
    };
    if let Err(e) = plan.check_quota(resource, current) {
        tracing::info!(
            restaurant_id,
            plan = %plan,
            resource = resource.as_str(),
            current,
            "Plan limit reached"
        );
        return Err(e.into());
    }
    Ok(())
}
