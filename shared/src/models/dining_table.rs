//! Dining Table Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Length of the random token printed into a table's QR code
pub const QR_TOKEN_LEN: usize = 24;

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    pub zone_id: Option<i64>,
    pub capacity: i32,
    /// Secret part of the QR URL; rotating it invalidates printed codes
    pub qr_token: String,
    pub is_active: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub zone_id: Option<i64>,
    pub capacity: Option<i32>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub zone_id: Option<i64>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

/// QR link returned to the dashboard for printing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrLink {
    pub table_id: i64,
    pub url: String,
}

const DEFAULT_CAPACITY: i32 = 4;
const MAX_CAPACITY: i32 = 100;

impl DiningTableCreate {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        validate_capacity(self.capacity)
    }

    pub fn capacity_or_default(&self) -> i32 {
        self.capacity.unwrap_or(DEFAULT_CAPACITY)
    }
}

impl DiningTableUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::required("name"));
        }
        validate_capacity(self.capacity)
    }
}

fn validate_capacity(capacity: Option<i32>) -> AppResult<()> {
    match capacity {
        Some(c) if !(1..=MAX_CAPACITY).contains(&c) => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Capacity must be between 1 and {MAX_CAPACITY}"),
        )),
        _ => Ok(()),
    }
}

pub fn generate_qr_token() -> String {
    crate::util::random_token(QR_TOKEN_LEN)
}

/// Customer-facing URL encoded into the table's QR code
pub fn qr_url(public_base_url: &str, qr_token: &str) -> String {
    format!("{}/t/{}", public_base_url.trim_end_matches('/'), qr_token)
}

/// Cheap shape check before touching the database
pub fn is_plausible_qr_token(token: &str) -> bool {
    token.len() == QR_TOKEN_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
}
