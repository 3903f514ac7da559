//! Inventory Models: stock items, order deductions, wastage

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderItem;
use super::menu_item::RecipeLine;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::util::{MAX_MONEY, MAX_QUANTITY, round_money};

/// Stock item (ingredient or consumable)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    /// Display unit: "kg", "l", "pcs", ...
    pub unit: String,
    pub quantity: Decimal,
    pub low_stock_threshold: Decimal,
    pub cost_per_unit: Decimal,
    pub updated_at: i64,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub low_stock_threshold: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
}

impl InventoryItemCreate {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        if self.unit.trim().is_empty() {
            return Err(AppError::required("unit"));
        }
        non_negative("quantity", self.quantity, MAX_QUANTITY)?;
        non_negative("low_stock_threshold", self.low_stock_threshold, MAX_QUANTITY)?;
        non_negative("cost_per_unit", self.cost_per_unit, MAX_MONEY)
    }
}

impl InventoryItemUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::required("name"));
        }
        if let Some(v) = self.low_stock_threshold {
            non_negative("low_stock_threshold", v, MAX_QUANTITY)?;
        }
        if let Some(v) = self.cost_per_unit {
            non_negative("cost_per_unit", v, MAX_MONEY)?;
        }
        Ok(())
    }
}

/// Restock payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockRequest {
    pub quantity: Decimal,
    pub note: Option<String>,
}

impl RestockRequest {
    pub fn validate(&self) -> AppResult<()> {
        positive(self.quantity)
    }
}

/// Stock consumed by an order entering the kitchen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Deduction {
    pub id: i64,
    pub order_id: i64,
    pub inventory_item_id: i64,
    pub item_name: String,
    /// Amount actually taken from stock
    pub quantity: Decimal,
    /// Recipe usage that stock could not cover
    pub shortfall: Decimal,
    pub created_at: i64,
}

/// Stock thrown away
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Wastage {
    pub id: i64,
    pub inventory_item_id: i64,
    pub item_name: String,
    pub quantity: Decimal,
    pub reason: String,
    pub cost: Decimal,
    pub recorded_by: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WastageCreate {
    pub inventory_item_id: i64,
    pub quantity: Decimal,
    pub reason: String,
}

impl WastageCreate {
    pub fn validate(&self) -> AppResult<()> {
        positive(self.quantity)?;
        if self.reason.trim().is_empty() {
            return Err(AppError::required("reason"));
        }
        Ok(())
    }
}

/// Time window filter (Unix millis, inclusive start, exclusive end)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl TimeRange {
    pub fn bounds(&self) -> (i64, i64) {
        (self.from.unwrap_or(0), self.to.unwrap_or(i64::MAX))
    }
}

/// Deduction list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeductionQuery {
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastageSummaryLine {
    pub inventory_item_id: i64,
    pub item_name: String,
    pub quantity: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastageSummary {
    pub total_cost: Decimal,
    /// Sorted by cost, highest first
    pub items: Vec<WastageSummaryLine>,
}

/// Aggregate recipe usage for a set of order lines.
///
/// `recipe_of` resolves a menu item id to its recipe; items without a recipe
/// consume nothing. Result is keyed by inventory item id. Each total is capped
/// at [`MAX_QUANTITY`]; anything above it is more than any stock can cover.
pub fn plan_usage<'a>(
    items: &[OrderItem],
    recipe_of: impl Fn(i64) -> Option<&'a [RecipeLine]>,
) -> BTreeMap<i64, Decimal> {
    let mut usage = BTreeMap::new();
    for line in items {
        let Some(recipe) = recipe_of(line.menu_item_id) else {
            continue;
        };
        for ingredient in recipe {
            let total = usage
                .entry(ingredient.inventory_item_id)
                .or_insert(Decimal::ZERO);
            let next = ingredient
                .quantity
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|used| total.checked_add(used))
                .map_or(MAX_QUANTITY, |sum| sum.min(MAX_QUANTITY));
            *total = next;
        }
    }
    usage
}

/// Take `wanted` from `stock`. Stock never goes below zero; returns
/// `(new_stock, taken, shortfall)`.
pub fn apply_deduction(stock: Decimal, wanted: Decimal) -> (Decimal, Decimal, Decimal) {
    let available = stock.max(Decimal::ZERO);
    let taken = wanted.min(available);
    (stock - taken, taken, wanted - taken)
}

/// Cost of throwing `quantity` away
pub fn wastage_cost(quantity: Decimal, cost_per_unit: Decimal) -> Decimal {
    round_money(quantity * cost_per_unit)
}

pub fn summarize_wastage(records: &[Wastage]) -> WastageSummary {
    let mut lines: BTreeMap<i64, WastageSummaryLine> = BTreeMap::new();
    for w in records {
        let line = lines
            .entry(w.inventory_item_id)
            .or_insert_with(|| WastageSummaryLine {
                inventory_item_id: w.inventory_item_id,
                item_name: w.item_name.clone(),
                quantity: Decimal::ZERO,
                cost: Decimal::ZERO,
            });
        line.quantity += w.quantity;
        line.cost += w.cost;
    }
    let mut items: Vec<WastageSummaryLine> = lines.into_values().collect();
    items.sort_by(|a, b| b.cost.cmp(&a.cost).then(a.inventory_item_id.cmp(&b.inventory_item_id)));
    WastageSummary {
        total_cost: items.iter().map(|l| l.cost).sum(),
        items,
    }
}

fn non_negative(field: &str, value: Decimal, max: Decimal) -> AppResult<()> {
    if value < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must not be negative"),
        ));
    }
    if value > max {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must not exceed {max}"),
        ));
    }
    Ok(())
}

fn positive(value: Decimal) -> AppResult<()> {
    if value <= Decimal::ZERO || value > MAX_QUANTITY {
        return Err(AppError::new(ErrorCode::InvalidInventoryQuantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn order_line(menu_item_id: i64, quantity: i32) -> OrderItem {
        OrderItem {
            menu_item_id,
            name: String::new(),
            unit_price: Decimal::ONE,
            quantity,
            notes: None,
            line_total: Decimal::from(quantity),
        }
    }

    fn recipe(pairs: &[(i64, Decimal)]) -> Vec<RecipeLine> {
        pairs
            .iter()
            .map(|(id, q)| RecipeLine {
                inventory_item_id: *id,
                quantity: *q,
            })
            .collect()
    }

    #[test]
    fn test_plan_usage_aggregates_across_lines() {
        let mut recipes: HashMap<i64, Vec<RecipeLine>> = HashMap::new();
        // Dosa: 0.2 batter, 0.05 oil; Uttapam: 0.3 batter
        recipes.insert(1, recipe(&[(100, Decimal::new(2, 1)), (101, Decimal::new(5, 2))]));
        recipes.insert(2, recipe(&[(100, Decimal::new(3, 1))]));

        let usage = plan_usage(
            &[order_line(1, 2), order_line(2, 1), order_line(3, 4)],
            |id| recipes.get(&id).map(Vec::as_slice),
        );

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[&100], Decimal::new(7, 1));
        assert_eq!(usage[&101], Decimal::new(1, 1));
    }

    #[test]
    fn test_plan_usage_caps_instead_of_overflowing() {
        let mut recipes: HashMap<i64, Vec<RecipeLine>> = HashMap::new();
        let huge = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        recipes.insert(1, recipe(&[(100, huge)]));
        recipes.insert(2, recipe(&[(100, MAX_QUANTITY), (101, Decimal::ONE)]));

        let usage = plan_usage(
            &[order_line(1, 99), order_line(2, 3)],
            |id| recipes.get(&id).map(Vec::as_slice),
        );

        assert_eq!(usage[&100], MAX_QUANTITY);
        assert_eq!(usage[&101], Decimal::new(3, 0));
    }

    #[test]
    fn test_quantities_bounded_by_column() {
        let restock = |quantity| RestockRequest { quantity, note: None };
        assert!(restock(MAX_QUANTITY).validate().is_ok());
        assert_eq!(
            restock(MAX_QUANTITY + Decimal::ONE).validate().unwrap_err().code,
            ErrorCode::InvalidInventoryQuantity
        );

        let create = InventoryItemCreate {
            name: "Rice".into(),
            unit: "kg".into(),
            quantity: Decimal::ONE,
            low_stock_threshold: Decimal::ZERO,
            cost_per_unit: MAX_MONEY + Decimal::ONE,
        };
        assert_eq!(create.validate().unwrap_err().code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_apply_deduction_covers() {
        let (stock, taken, short) = apply_deduction(Decimal::new(10, 0), Decimal::new(3, 0));
        assert_eq!(stock, Decimal::new(7, 0));
        assert_eq!(taken, Decimal::new(3, 0));
        assert_eq!(short, Decimal::ZERO);
    }

    #[test]
    fn test_apply_deduction_floors_at_zero() {
        let (stock, taken, short) = apply_deduction(Decimal::new(2, 0), Decimal::new(5, 0));
        assert_eq!(stock, Decimal::ZERO);
        assert_eq!(taken, Decimal::new(2, 0));
        assert_eq!(short, Decimal::new(3, 0));
    }

    #[test]
    fn test_low_stock() {
        let mut item = InventoryItem {
            id: 1,
            name: "Rice".into(),
            unit: "kg".into(),
            quantity: Decimal::new(5, 0),
            low_stock_threshold: Decimal::new(5, 0),
            cost_per_unit: Decimal::new(60, 0),
            updated_at: 0,
        };
        assert!(item.is_low_stock());
        item.quantity = Decimal::new(51, 1);
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_wastage_summary() {
        let rec = |item: i64, name: &str, qty: i64, cost: i64| Wastage {
            id: 0,
            inventory_item_id: item,
            item_name: name.into(),
            quantity: Decimal::from(qty),
            reason: "spoiled".into(),
            cost: Decimal::from(cost),
            recorded_by: None,
            created_at: 0,
        };
        let summary = summarize_wastage(&[
            rec(1, "Milk", 2, 100),
            rec(2, "Paneer", 1, 400),
            rec(1, "Milk", 1, 50),
        ]);
        assert_eq!(summary.total_cost, Decimal::from(550));
        assert_eq!(summary.items[0].item_name, "Paneer");
        assert_eq!(summary.items[1].quantity, Decimal::from(3));
        assert_eq!(summary.items[1].cost, Decimal::from(150));
    }

    #[test]
    fn test_wastage_validation() {
        let w = WastageCreate {
            inventory_item_id: 1,
            quantity: Decimal::ZERO,
            reason: "dropped".into(),
        };
        assert_eq!(
            w.validate().unwrap_err().code,
            ErrorCode::InvalidInventoryQuantity
        );
        assert_eq!(
            wastage_cost(Decimal::new(15, 1), Decimal::new(3333, 2)),
            Decimal::new(5000, 2)
        );
    }
}
