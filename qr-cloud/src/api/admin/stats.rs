//! GET /api/admin/stats

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use shared::models::{DashboardStats, TimeRange, dashboard_window, summarize_orders};
use shared::util::now_millis;

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;

/// Order totals for the range plus the current pending call and low stock counts.
///
/// Without a range the last 30 days are summarised.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Query(range): Query<TimeRange>,
) -> ApiResult<DashboardStats> {
    require_manager(&identity)?;
    let rid = identity.restaurant_id;
    let (from, to) = dashboard_window(&range, now_millis());

    let orders = db::orders::list_range(&state.pool, rid, from, to)
        .await
        .map_err(internal)?;
    let pending_staff_calls = db::staff_calls::pending_count(&state.pool, rid)
        .await
        .map_err(internal)?;
    let low_stock_items = db::inventory::low_stock_count(&state.pool, rid)
        .await
        .map_err(internal)?;

    Ok(Json(DashboardStats {
        from,
        to,
        orders: summarize_orders(&orders),
        pending_staff_calls,
        low_stock_items,
    }))
}
