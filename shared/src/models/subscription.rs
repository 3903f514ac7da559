//! Subscription Model
//!
//! Restaurants pay for a plan through the payment gateway. The plan caps how
//! many tables and staff accounts a restaurant may hold. A restaurant without
//! an active subscription is on the free plan.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

text_enum! {
    pub enum Plan {
        Free => "free",
        Basic => "basic",
        Pro => "pro",
        Enterprise => "enterprise",
    }
}

/// Resource caps for a plan, `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_tables: Option<i64>,
    pub max_staff: Option<i64>,
}

/// Resource kinds capped by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaResource {
    Tables,
    Staff,
}

impl QuotaResource {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaResource::Tables => "tables",
            QuotaResource::Staff => "staff",
        }
    }
}

impl Plan {
    pub fn limits(self) -> PlanLimits {
        let (max_tables, max_staff) = match self {
            Plan::Free => (Some(3), Some(2)),
            Plan::Basic => (Some(10), Some(5)),
            Plan::Pro => (Some(50), Some(25)),
            Plan::Enterprise => (None, None),
        };
        PlanLimits {
            max_tables,
            max_staff,
        }
    }

    /// Plans that can be bought through the gateway
    pub fn is_purchasable(self) -> bool {
        !matches!(self, Plan::Free)
    }

    /// Fails with `PlanLimitReached` when one more `resource` would exceed the cap
    pub fn check_quota(self, resource: QuotaResource, current: i64) -> AppResult<()> {
        let limits = self.limits();
        let max = match resource {
            QuotaResource::Tables => limits.max_tables,
            QuotaResource::Staff => limits.max_staff,
        };
        match max {
            Some(max) if current >= max => Err(AppError::with_message(
                ErrorCode::PlanLimitReached,
                format!(
                    "The {self} plan allows at most {max} {}",
                    resource.as_str()
                ),
            )
            .with_detail("plan", self.as_str())
            .with_detail("resource", resource.as_str())
            .with_detail("max", max)),
            _ => Ok(()),
        }
    }
}

text_enum! {
    /// Gateway subscription lifecycle
    pub enum SubscriptionStatus {
        Created => "created",
        Authenticated => "authenticated",
        Active => "active",
        Pending => "pending",
        Halted => "halted",
        Cancelled => "cancelled",
        Completed => "completed",
        Expired => "expired",
    }
}

impl SubscriptionStatus {
    /// Status that grants the plan's limits
    pub fn grants_plan(self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Authenticated
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: i64,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Gateway-side subscription id (`sub_...`)
    pub gateway_subscription_id: String,
    pub current_period_end: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Plan in effect for a restaurant given its latest subscription
pub fn effective_plan(latest: Option<&Subscription>) -> Plan {
    match latest {
        Some(sub) if sub.status.grants_plan() => sub.plan,
        _ => Plan::Free,
    }
}

/// Status a gateway webhook event moves a subscription into
pub fn status_for_event(event: &str) -> Option<SubscriptionStatus> {
    match event {
        "subscription.authenticated" => Some(SubscriptionStatus::Authenticated),
        "subscription.activated" | "subscription.charged" | "subscription.resumed" => {
            Some(SubscriptionStatus::Active)
        }
        "subscription.pending" => Some(SubscriptionStatus::Pending),
        "subscription.halted" => Some(SubscriptionStatus::Halted),
        "subscription.cancelled" => Some(SubscriptionStatus::Cancelled),
        "subscription.completed" => Some(SubscriptionStatus::Completed),
        _ => None,
    }
}

/// Create subscription payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCreate {
    pub plan: String,
}

impl SubscriptionCreate {
    /// Parse and check the requested plan
    pub fn plan(&self) -> AppResult<Plan> {
        let plan: Plan = self.plan.trim().parse().map_err(|_| {
            AppError::with_message(ErrorCode::UnknownPlan, format!("Unknown plan: {}", self.plan))
        })?;
        if !plan.is_purchasable() {
            return Err(AppError::with_message(
                ErrorCode::UnknownPlan,
                format!("Plan {plan} cannot be purchased"),
            ));
        }
        Ok(plan)
    }
}

/// What the client needs to open gateway checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCheckout {
    pub subscription_id: String,
    pub key_id: String,
    pub plan: Plan,
}

/// Checkout callback payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionVerify {
    pub payment_id: String,
    pub subscription_id: String,
    pub signature: String,
}

/// Current plan overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub subscription: Option<Subscription>,
    pub table_count: i64,
    pub staff_count: i64,
}
