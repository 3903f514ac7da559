//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::util::{MAX_MONEY, MAX_QUANTITY};

/// Inventory consumed by one unit of a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub inventory_item_id: i64,
    pub quantity: Decimal,
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub is_veg: bool,
    /// Zones this item is offered in. Empty means every zone.
    pub zone_ids: Vec<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub recipe: Vec<RecipeLine>,
}

impl MenuItem {
    /// Whether a customer seated in `zone_id` may see and order this item.
    ///
    /// Tables without a zone only see unrestricted items.
    pub fn is_visible_in_zone(&self, zone_id: Option<i64>) -> bool {
        if !self.is_available {
            return false;
        }
        if self.zone_ids.is_empty() {
            return true;
        }
        zone_id.is_some_and(|z| self.zone_ids.contains(&z))
    }
}

/// Customer-facing projection (no recipe, no internal flags)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicMenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_veg: bool,
}

impl From<&MenuItem> for PublicMenuItem {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            is_veg: item.is_veg,
        }
    }
}

/// Filter a full menu down to what a table in `zone_id` may order
pub fn visible_menu(items: &[MenuItem], zone_id: Option<i64>) -> Vec<PublicMenuItem> {
    items
        .iter()
        .filter(|item| item.is_visible_in_zone(zone_id))
        .map(PublicMenuItem::from)
        .collect()
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_veg: bool,
    #[serde(default)]
    pub zone_ids: Vec<i64>,
    #[serde(default)]
    pub recipe: Vec<RecipeLine>,
}

fn default_true() -> bool {
    true
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub is_veg: Option<bool>,
    pub zone_ids: Option<Vec<i64>>,
    pub recipe: Option<Vec<RecipeLine>>,
}

/// Availability toggle payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}

impl MenuItemCreate {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        validate_price(self.price)?;
        validate_recipe(&self.recipe)
    }
}

impl MenuItemUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::required("name"));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(recipe) = &self.recipe {
            validate_recipe(recipe)?;
        }
        Ok(())
    }
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            "Price must not be negative",
        ));
    }
    if price > MAX_MONEY {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("Price must not exceed {MAX_MONEY}"),
        ));
    }
    Ok(())
}

fn validate_recipe(recipe: &[RecipeLine]) -> AppResult<()> {
    if let Some(line) = recipe.iter().find(|l| l.quantity <= Decimal::ZERO) {
        return Err(AppError::with_message(
            ErrorCode::InvalidInventoryQuantity,
            "Recipe quantities must be positive",
        )
        .with_detail("inventory_item_id", line.inventory_item_id));
    }
    if let Some(line) = recipe.iter().find(|l| l.quantity > MAX_QUANTITY) {
        return Err(AppError::with_message(
            ErrorCode::InvalidInventoryQuantity,
            format!("Recipe quantities must not exceed {MAX_QUANTITY}"),
        )
        .with_detail("inventory_item_id", line.inventory_item_id));
    }
    Ok(())
}
