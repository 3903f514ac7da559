//! Staff Member Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

pub const MIN_PASSWORD_LEN: usize = 8;

text_enum! {
    pub enum StaffRole {
        Owner => "owner",
        Manager => "manager",
        Waiter => "waiter",
        Chef => "chef",
        Cashier => "cashier",
    }
}

impl StaffRole {
    /// Owners and managers administer zones, tables, menu, staff and billing
    pub fn can_manage(self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Manager)
    }
}

/// Staff member entity (password hash never leaves the db layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create staff payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: StaffRole,
}

/// Update staff payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub role: Option<StaffRole>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl StaffCreate {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        // A restaurant has exactly one owner, created at registration
        if self.role == StaffRole::Owner {
            return Err(AppError::with_message(
                ErrorCode::InvalidRole,
                "Owner role cannot be assigned",
            ));
        }
        Ok(())
    }
}

impl StaffUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::required("name"));
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if self.role == Some(StaffRole::Owner) {
            return Err(AppError::with_message(
                ErrorCode::InvalidRole,
                "Owner role cannot be assigned",
            ));
        }
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::required("email"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "Invalid email address",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    Ok(())
}
