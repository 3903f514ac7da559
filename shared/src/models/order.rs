//! Order Model
//!
//! An order is placed from a table session and carries its line items
//! embedded. Prices are snapshotted at placement time so later menu edits
//! never change what the customer was charged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::customer::CustomerInput;
use super::menu_item::MenuItem;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::util::round_money;

/// Upper bound for a single line's quantity
pub const MAX_LINE_QUANTITY: i32 = 99;
/// Upper bound for distinct lines in one order
pub const MAX_ORDER_LINES: usize = 50;

text_enum! {
    /// Kitchen lifecycle of an order
    pub enum OrderStatus {
        Pending => "pending",
        Preparing => "preparing",
        Ready => "ready",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl OrderStatus {
    /// Legal transitions:
    /// `pending → preparing | cancelled`, `preparing → ready | cancelled`,
    /// `ready → completed`. Completed and cancelled are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Pending, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, Completed)
        )
    }

    /// Check a transition, mapping terminal states to their specific codes
    pub fn check_transition(self, next: OrderStatus) -> AppResult<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        let code = match self {
            OrderStatus::Completed => ErrorCode::OrderAlreadyCompleted,
            OrderStatus::Cancelled => ErrorCode::OrderCancelled,
            _ => ErrorCode::InvalidStatusTransition,
        };
        Err(AppError::with_message(
            code,
            format!("Cannot move order from {self} to {next}"),
        )
        .with_detail("from", self.as_str())
        .with_detail("to", next.as_str()))
    }
}

text_enum! {
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
    }
}

/// Line item embedded in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub notes: Option<String>,
    pub line_total: Decimal,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub table_name: String,
    pub zone_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One line of the customer's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Place order payload (customer side, table comes from the session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub customer: Option<CustomerInput>,
    pub notes: Option<String>,
}

/// Status change payload (staff side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Order list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i64>,
    /// Only pending/preparing/ready
    #[serde(default)]
    pub active_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// `tax = round2(subtotal × rate / 100)`, `total = subtotal + tax`
    pub fn compute(items: &[OrderItem], tax_rate_percent: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let tax = round_money(subtotal * tax_rate_percent / Decimal::ONE_HUNDRED);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Turn a cart into priced line items.
///
/// `menu` is the restaurant's full menu; every cart line must reference an
/// item visible from `zone_id`.
pub fn price_cart(
    cart: &[CartLine],
    menu: &[MenuItem],
    zone_id: Option<i64>,
) -> AppResult<Vec<OrderItem>> {
    if cart.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if cart.len() > MAX_ORDER_LINES {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("An order may contain at most {MAX_ORDER_LINES} lines"),
        ));
    }

    cart.iter()
        .map(|line| {
            if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
                return Err(AppError::with_message(
                    ErrorCode::InvalidQuantity,
                    format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
                )
                .with_detail("menu_item_id", line.menu_item_id));
            }

            let item = menu
                .iter()
                .find(|m| m.id == line.menu_item_id)
                .filter(|m| m.is_visible_in_zone(zone_id))
                .ok_or_else(|| {
                    AppError::new(ErrorCode::ItemNotOrderable)
                        .with_detail("menu_item_id", line.menu_item_id)
                })?;

            let notes = line
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from);

            Ok(OrderItem {
                menu_item_id: item.id,
                name: item.name.clone(),
                unit_price: item.price,
                quantity: line.quantity,
                notes,
                line_total: item.price * Decimal::from(line.quantity),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<MenuItem> {
        vec![
            MenuItem {
                id: 1,
                name: "Paneer Tikka".into(),
                description: None,
                category: Some("Starters".into()),
                price: Decimal::new(24950, 2),
                image_url: None,
                is_available: true,
                is_veg: true,
                zone_ids: vec![],
                recipe: vec![],
            },
            MenuItem {
                id: 2,
                name: "Hookah".into(),
                description: None,
                category: None,
                price: Decimal::new(500, 0),
                image_url: None,
                is_available: true,
                is_veg: true,
                zone_ids: vec![99],
                recipe: vec![],
            },
        ]
    }

    fn line(id: i64, qty: i32) -> CartLine {
        CartLine {
            menu_item_id: id,
            quantity: qty,
            notes: None,
        }
    }

    #[test]
    fn test_legal_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Cancelled));
    }

    #[test]
    fn test_illegal_transitions() {
        use OrderStatus::*;
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Preparing));
        for next in OrderStatus::ALL {
            assert!(!Completed.can_transition_to(*next));
            assert!(!Cancelled.can_transition_to(*next));
        }
    }

    #[test]
    fn test_check_transition_codes() {
        use OrderStatus::*;
        assert_eq!(
            Completed.check_transition(Ready).unwrap_err().code,
            ErrorCode::OrderAlreadyCompleted
        );
        assert_eq!(
            Cancelled.check_transition(Preparing).unwrap_err().code,
            ErrorCode::OrderCancelled
        );
        assert_eq!(
            Pending.check_transition(Completed).unwrap_err().code,
            ErrorCode::InvalidStatusTransition
        );
    }

    #[test]
    fn test_status_text_roundtrip() {
        assert_eq!("preparing".parse::<OrderStatus>(), Ok(OrderStatus::Preparing));
        assert!("done".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Ready).unwrap(),
            "\"ready\""
        );
    }

    #[test]
    fn test_price_cart_snapshots_prices() {
        let items = price_cart(&[line(1, 2)], &menu(), Some(5)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Paneer Tikka");
        assert_eq!(items[0].unit_price, Decimal::new(24950, 2));
        assert_eq!(items[0].line_total, Decimal::new(49900, 2));
    }

    #[test]
    fn test_price_cart_rejects_empty() {
        assert_eq!(
            price_cart(&[], &menu(), None).unwrap_err().code,
            ErrorCode::OrderEmpty
        );
    }

    #[test]
    fn test_price_cart_rejects_bad_quantity() {
        for qty in [0, -1, MAX_LINE_QUANTITY + 1] {
            assert_eq!(
                price_cart(&[line(1, qty)], &menu(), None).unwrap_err().code,
                ErrorCode::InvalidQuantity
            );
        }
    }

    #[test]
    fn test_price_cart_rejects_hidden_or_unknown_items() {
        // Hookah only exists in zone 99
        assert_eq!(
            price_cart(&[line(2, 1)], &menu(), Some(5)).unwrap_err().code,
            ErrorCode::ItemNotOrderable
        );
        assert!(price_cart(&[line(2, 1)], &menu(), Some(99)).is_ok());
        assert_eq!(
            price_cart(&[line(42, 1)], &menu(), None).unwrap_err().code,
            ErrorCode::ItemNotOrderable
        );
    }

    #[test]
    fn test_price_cart_follows_table_zone_changes() {
        // Same cart, table moved out of zone 99 and then back in
        let cart = [line(1, 1), line(2, 1)];
        assert!(price_cart(&cart, &menu(), Some(99)).is_ok());
        assert_eq!(
            price_cart(&cart, &menu(), None).unwrap_err().code,
            ErrorCode::ItemNotOrderable
        );
        let items = price_cart(&cart, &menu(), Some(99)).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_totals_with_tax() {
        let items = price_cart(&[line(1, 1), line(2, 2)], &menu(), Some(99)).unwrap();
        // 249.50 + 1000 = 1249.50, 5% tax = 62.475 -> 62.48
        let totals = OrderTotals::compute(&items, Decimal::new(5, 0));
        assert_eq!(totals.subtotal, Decimal::new(124950, 2));
        assert_eq!(totals.tax, Decimal::new(6248, 2));
        assert_eq!(totals.total, Decimal::new(131198, 2));
    }

    #[test]
    fn test_totals_zero_tax() {
        let items = price_cart(&[line(1, 3)], &menu(), None).unwrap();
        let totals = OrderTotals::compute(&items, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_query_bounds() {
        let q = OrderQuery {
            limit: Some(10_000),
            offset: Some(-3),
            ..Default::default()
        };
        assert_eq!(q.limit(), 200);
        assert_eq!(q.offset(), 0);
        assert_eq!(OrderQuery::default().limit(), 50);
    }
}
