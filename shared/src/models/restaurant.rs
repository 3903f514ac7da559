//! Restaurant Model (the tenant)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Restaurant entity. Every other record hangs off one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    /// URL slug, unique across the platform
    pub slug: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// ISO 4217 code, e.g. "INR"
    pub currency: String,
    /// Tax rate in percent applied to order subtotals
    pub tax_rate: Decimal,
    pub logo_url: Option<String>,
    pub created_at: i64,
}

/// Update restaurant payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub logo_url: Option<String>,
}

impl RestaurantUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::required("name"));
        }
        if let Some(currency) = &self.currency
            && !is_currency_code(currency)
        {
            return Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Invalid currency code: {currency}"),
            ));
        }
        if let Some(rate) = self.tax_rate {
            validate_tax_rate(rate)?;
        }
        Ok(())
    }
}

pub fn validate_tax_rate(rate: Decimal) -> AppResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "Tax rate must be between 0 and 100",
        ));
    }
    Ok(())
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// Derive a URL slug from a restaurant name: lowercase ASCII words joined by '-'.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("restaurant");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Spice Route"), "the-spice-route");
        assert_eq!(slugify("  Café  Mocha!! 24x7 "), "caf-mocha-24x7");
        assert_eq!(slugify("***"), "restaurant");
    }

    #[test]
    fn test_update_validation() {
        let ok = RestaurantUpdate {
            currency: Some("INR".into()),
            tax_rate: Some(Decimal::new(5, 0)),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_rate = RestaurantUpdate {
            tax_rate: Some(Decimal::new(101, 0)),
            ..Default::default()
        };
        assert_eq!(
            bad_rate.validate().unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );

        let bad_currency = RestaurantUpdate {
            currency: Some("rupees".into()),
            ..Default::default()
        };
        assert_eq!(
            bad_currency.validate().unwrap_err().code,
            ErrorCode::InvalidFormat
        );

        let blank_name = RestaurantUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            blank_name.validate().unwrap_err().code,
            ErrorCode::RequiredField
        );
    }
}
