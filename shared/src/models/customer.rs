//! Customer Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Customer entity, identified per restaurant by phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: Option<String>,
    pub phone: String,
    /// Paid orders
    pub visit_count: i32,
    pub total_spent: Decimal,
    pub last_visit_at: Option<i64>,
    pub created_at: i64,
}

/// Optional customer details supplied with an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerInput {
    /// Normalized `(phone, name)` when a usable phone was given.
    ///
    /// A name without a phone is kept on the order only, no customer record.
    pub fn normalized(&self) -> AppResult<Option<(String, Option<String>)>> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);
        match self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => Ok(Some((normalize_phone(phone)?, name))),
            None => Ok(None),
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
    }
}

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Strip separators, keep an optional leading '+'.
pub fn normalize_phone(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let mut digits = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            '+' if digits.is_empty() => {}
            _ => {
                return Err(AppError::with_message(
                    ErrorCode::InvalidFormat,
                    format!("Invalid phone number: {raw}"),
                ));
            }
        }
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("Invalid phone number: {raw}"),
        ));
    }
    Ok(if plus { format!("+{digits}") } else { digits })
}

/// Customer list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerQuery {
    /// Substring of name or phone
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("(020) 555 0199").unwrap(), "0205550199");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98765abc10").is_err());
        assert!(normalize_phone("9876+543210").is_err());
    }

    #[test]
    fn test_customer_input() {
        let input = CustomerInput {
            name: Some("  Asha ".into()),
            phone: Some(" 9876543210 ".into()),
        };
        assert_eq!(
            input.normalized().unwrap(),
            Some(("9876543210".to_string(), Some("Asha".to_string())))
        );

        let nameless = CustomerInput {
            name: Some("Ravi".into()),
            phone: Some("   ".into()),
        };
        assert_eq!(nameless.normalized().unwrap(), None);
        assert_eq!(nameless.display_name().as_deref(), Some("Ravi"));
    }
}
