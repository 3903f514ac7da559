//! Staff Call Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

const MAX_MESSAGE_LEN: usize = 500;

text_enum! {
    /// Why the customer is calling
    pub enum StaffCallReason {
        Assistance => "assistance",
        Water => "water",
        Bill => "bill",
        Cleaning => "cleaning",
        Other => "other",
    }
}

text_enum! {
    pub enum StaffCallStatus {
        Pending => "pending",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
    }
}

impl StaffCallStatus {
    /// `pending → acknowledged | resolved`, `acknowledged → resolved`
    pub fn can_transition_to(self, next: StaffCallStatus) -> bool {
        use StaffCallStatus::*;
        matches!(
            (self, next),
            (Pending, Acknowledged) | (Pending, Resolved) | (Acknowledged, Resolved)
        )
    }

    pub fn check_transition(self, next: StaffCallStatus) -> AppResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::with_message(
                ErrorCode::StaffCallAlreadyHandled,
                format!("Staff call is already {self}"),
            ))
        }
    }
}

/// Staff call entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffCall {
    pub id: i64,
    pub table_id: i64,
    pub table_name: String,
    pub reason: StaffCallReason,
    pub message: Option<String>,
    pub status: StaffCallStatus,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_at: Option<i64>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

/// Create staff call payload (table comes from the session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCallCreate {
    pub reason: StaffCallReason,
    pub message: Option<String>,
}

impl StaffCallCreate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(msg) = &self.message
            && msg.chars().count() > MAX_MESSAGE_LEN
        {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("Message must be at most {MAX_MESSAGE_LEN} characters"),
            ));
        }
        Ok(())
    }
}

/// Staff call list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffCallQuery {
    pub status: Option<StaffCallStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_transitions() {
        use StaffCallStatus::*;
        assert!(Pending.can_transition_to(Acknowledged));
        assert!(Pending.can_transition_to(Resolved));
        assert!(Acknowledged.can_transition_to(Resolved));
        assert!(!Acknowledged.can_transition_to(Acknowledged));
        assert!(!Resolved.can_transition_to(Pending));
        assert_eq!(
            Resolved.check_transition(Acknowledged).unwrap_err().code,
            ErrorCode::StaffCallAlreadyHandled
        );
    }

    #[test]
    fn test_reason_parse() {
        let create: StaffCallCreate =
            serde_json::from_str(r#"{"reason":"water","message":null}"#).unwrap();
        assert_eq!(create.reason, StaffCallReason::Water);
        assert!(serde_json::from_str::<StaffCallCreate>(r#"{"reason":"dance"}"#).is_err());
    }

    #[test]
    fn test_message_length() {
        let create = StaffCallCreate {
            reason: StaffCallReason::Other,
            message: Some("x".repeat(501)),
        };
        assert_eq!(
            create.validate().unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }
}
