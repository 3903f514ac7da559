//! Dashboard statistics

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inventory::TimeRange;
use super::order::{Order, OrderStatus, PaymentStatus};
use crate::util::round_money;

pub const TOP_ITEMS: usize = 5;

const DAY_MS: i64 = 86_400_000;
/// Look-back when the dashboard is given no start
pub const DEFAULT_WINDOW_MS: i64 = 30 * DAY_MS;
/// Longest span one dashboard request may cover
pub const MAX_WINDOW_MS: i64 = 366 * DAY_MS;

/// Resolve the dashboard window at `now` (Unix millis).
///
/// A missing `to` ends the window just after `now`; a missing `from` starts it
/// [`DEFAULT_WINDOW_MS`] earlier. Wider requests are cut to the last
/// [`MAX_WINDOW_MS`] before `to`.
pub fn dashboard_window(range: &TimeRange, now: i64) -> (i64, i64) {
    let to = range.to.unwrap_or_else(|| now.saturating_add(1));
    let from = range
        .from
        .unwrap_or_else(|| to.saturating_sub(DEFAULT_WINDOW_MS))
        .max(to.saturating_sub(MAX_WINDOW_MS));
    (from, to)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopItem {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

/// Order figures over a time window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    /// Sum of paid order totals
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    pub top_items: Vec<TopItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub from: i64,
    pub to: i64,
    #[serde(flatten)]
    pub orders: OrderSummary,
    pub pending_staff_calls: i64,
    pub low_stock_items: i64,
}

pub fn summarize_orders(orders: &[Order]) -> OrderSummary {
    let mut summary = OrderSummary::default();
    let mut paid_count = 0i64;
    for order in orders {
        summary.order_count += 1;
        match order.status {
            OrderStatus::Completed => summary.completed_count += 1,
            OrderStatus::Cancelled => summary.cancelled_count += 1,
            _ => {}
        }
        if order.payment_status == PaymentStatus::Paid {
            summary.revenue += order.total;
            paid_count += 1;
        }
    }
    if paid_count > 0 {
        summary.average_order_value = round_money(summary.revenue / Decimal::from(paid_count));
    }
    summary.top_items = top_items(orders, TOP_ITEMS);
    summary
}

/// Best sellers by quantity across non-cancelled orders
pub fn top_items(orders: &[Order], n: usize) -> Vec<TopItem> {
    let mut by_item: HashMap<i64, TopItem> = HashMap::new();
    for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
        for line in &order.items {
            let entry = by_item.entry(line.menu_item_id).or_insert_with(|| TopItem {
                menu_item_id: line.menu_item_id,
                name: line.name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += i64::from(line.quantity);
            entry.revenue += line.line_total;
        }
    }
    let mut items: Vec<TopItem> = by_item.into_values().collect();
    items.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.menu_item_id.cmp(&b.menu_item_id))
    });
    items.truncate(n);
    items
}
