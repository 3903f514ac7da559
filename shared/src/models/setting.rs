//! Setting Model (per-restaurant key/value)

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub value: serde_json::Value,
    pub updated_at: i64,
}

/// Upsert payload, the key comes from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpsert {
    pub value: serde_json::Value,
}

const MAX_KEY_LEN: usize = 64;

/// Keys are short lowercase identifiers: `[a-z0-9_.-]{1,64}`
pub fn validate_setting_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::required("key"));
    }
    let valid = key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("Invalid setting key: {key}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_key() {
        assert!(validate_setting_key("order.auto_accept").is_ok());
        assert!(validate_setting_key("theme-color").is_ok());
        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("Upper").is_err());
        assert!(validate_setting_key(&"k".repeat(65)).is_err());
    }
}
