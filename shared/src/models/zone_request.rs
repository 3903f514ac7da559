//! Zone Request Model
//!
//! A customer asking to be moved to another seating zone.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

text_enum! {
    pub enum ZoneRequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ZoneRequest {
    pub id: i64,
    pub table_id: i64,
    pub table_name: String,
    pub current_zone_id: Option<i64>,
    pub requested_zone_id: i64,
    pub reason: Option<String>,
    pub status: ZoneRequestStatus,
    /// Table the party was moved to, set on approval
    pub target_table_id: Option<i64>,
    pub decided_by: Option<i64>,
    pub decided_at: Option<i64>,
    pub created_at: i64,
}

/// Create zone request payload (table comes from the session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRequestCreate {
    pub requested_zone_id: i64,
    pub reason: Option<String>,
}

impl ZoneRequestCreate {
    pub fn validate_against(&self, current_zone_id: Option<i64>) -> AppResult<()> {
        if current_zone_id == Some(self.requested_zone_id) {
            return Err(AppError::new(ErrorCode::ZoneUnchanged));
        }
        Ok(())
    }
}

/// Approve payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneRequestApproval {
    pub target_table_id: Option<i64>,
}

/// Zone request list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneRequestQuery {
    pub status: Option<ZoneRequestStatus>,
}

impl ZoneRequestStatus {
    pub fn check_decidable(self) -> AppResult<()> {
        if self == ZoneRequestStatus::Pending {
            Ok(())
        } else {
            Err(AppError::with_message(
                ErrorCode::ZoneRequestAlreadyDecided,
                format!("Zone request is already {self}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_zone_rejected() {
        let req = ZoneRequestCreate {
            requested_zone_id: 3,
            reason: None,
        };
        assert_eq!(
            req.validate_against(Some(3)).unwrap_err().code,
            ErrorCode::ZoneUnchanged
        );
        assert!(req.validate_against(Some(4)).is_ok());
        assert!(req.validate_against(None).is_ok());
    }

    #[test]
    fn test_only_pending_decidable() {
        assert!(ZoneRequestStatus::Pending.check_decidable().is_ok());
        assert_eq!(
            ZoneRequestStatus::Approved
                .check_decidable()
                .unwrap_err()
                .code,
            ErrorCode::ZoneRequestAlreadyDecided
        );
    }
}
