//! Unified error codes for the ordering platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors (staff tokens, QR sessions)
//! - 2xxx: Permission errors
//! - 3xxx: Restaurant and subscription errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu, upload and inventory errors
//! - 7xxx: Table, zone and floor-request errors
//! - 8xxx: Staff and customer errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as its u16 value so the dashboard and the customer app can
/// switch on it without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    InvalidRequest = 5,
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    ValueOutOfRange = 8,
    /// Per-IP rate limit exceeded
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    NotAuthenticated = 1001,
    /// Wrong email/password
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    /// QR table session has expired, customer must rescan
    SessionExpired = 1005,
    AccountDisabled = 1007,
    PasswordTooShort = 1008,

    // ==================== 2xxx: Permission ====================
    PermissionDenied = 2001,
    /// Owner or manager role required
    ManagerRequired = 2003,
    CannotDeleteOwner = 2005,

    // ==================== 3xxx: Restaurant ====================
    RestaurantNotFound = 3002,
    EmailAlreadyRegistered = 3003,
    /// Table/staff quota of the current plan is full
    PlanLimitReached = 3010,
    NoActiveSubscription = 3011,
    UnknownPlan = 3012,
    SubscriptionNotFound = 3013,
    /// Payment gateway signature did not verify
    SignatureInvalid = 3014,
    PaymentSetupFailed = 3017,
    SettingNotFound = 3020,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    OrderAlreadyPaid = 4002,
    OrderAlreadyCompleted = 4003,
    OrderCancelled = 4004,
    OrderEmpty = 4007,
    /// Requested status change is not a legal transition
    InvalidStatusTransition = 4008,
    /// Status changed concurrently by another staff member
    OrderStatusConflict = 4009,
    InvalidQuantity = 4010,
    /// Menu item missing, unavailable, or hidden from the table's zone
    ItemNotOrderable = 4011,

    // ==================== 5xxx: Payment ====================
    PaymentFailed = 5001,
    PaymentInsufficientAmount = 5002,
    PaymentInvalidMethod = 5003,
    PaymentAmountExceeds = 5005,

    // ==================== 6xxx: Menu ====================
    MenuItemNotFound = 6001,
    MenuItemInvalidPrice = 6002,
    MenuItemUnavailable = 6003,

    // ==================== 65xx: File Upload ====================
    FileTooLarge = 6501,
    UnsupportedFileFormat = 6502,
    InvalidImageFile = 6503,
    NoFileProvided = 6504,
    EmptyFile = 6505,
    NoFilename = 6506,
    InvalidFileExtension = 6507,
    FileStorageFailed = 6509,
    InvalidFilePath = 6510,

    // ==================== 66xx: Inventory ====================
    InventoryItemNotFound = 6601,
    InvalidInventoryQuantity = 6602,

    // ==================== 7xxx: Table ====================
    TableNotFound = 7001,
    TableInactive = 7002,
    ZoneNotFound = 7101,
    ZoneHasTables = 7102,
    ZoneNameExists = 7103,
    /// Zone change requested to the zone the table is already in
    ZoneUnchanged = 7104,
    TableNotInZone = 7105,
    StaffCallNotFound = 7201,
    StaffCallAlreadyHandled = 7202,
    ZoneRequestNotFound = 7301,
    ZoneRequestAlreadyDecided = 7302,

    // ==================== 8xxx: Staff ====================
    StaffNotFound = 8001,
    StaffEmailExists = 8002,
    StaffCannotDeleteSelf = 8003,
    InvalidRole = 8004,
    CustomerNotFound = 8101,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    ConfigError = 9005,
    /// Chat model endpoint failed or returned garbage
    UpstreamError = 9006,
    /// Payment gateway REST call failed
    GatewayError = 9007,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Table session has expired, please scan the QR code again",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ManagerRequired => "Owner or manager role is required",
            ErrorCode::CannotDeleteOwner => "Cannot delete the restaurant owner",

            // Restaurant
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::PlanLimitReached => "Limit of the current subscription plan reached",
            ErrorCode::NoActiveSubscription => "No active subscription",
            ErrorCode::UnknownPlan => "Unknown subscription plan",
            ErrorCode::SubscriptionNotFound => "Subscription not found",
            ErrorCode::SignatureInvalid => "Payment signature verification failed",
            ErrorCode::PaymentSetupFailed => "Payment setup failed",
            ErrorCode::SettingNotFound => "Setting not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderCancelled => "Order has been cancelled",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::OrderStatusConflict => "Order status was changed by someone else",
            ErrorCode::InvalidQuantity => "Invalid item quantity",
            ErrorCode::ItemNotOrderable => "Menu item cannot be ordered from this table",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentInsufficientAmount => "Insufficient payment amount",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentAmountExceeds => "Payment amount exceeds order total",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item has invalid price",
            ErrorCode::MenuItemUnavailable => "Menu item is unavailable",

            // File Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::NoFilename => "No filename provided",
            ErrorCode::InvalidFileExtension => "Invalid file extension",
            ErrorCode::FileStorageFailed => "File storage failed",
            ErrorCode::InvalidFilePath => "Invalid file path",

            // Inventory
            ErrorCode::InventoryItemNotFound => "Inventory item not found",
            ErrorCode::InvalidInventoryQuantity => "Inventory quantity must be positive",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableInactive => "Table is not active",
            ErrorCode::ZoneNotFound => "Zone not found",
            ErrorCode::ZoneHasTables => "Zone has associated tables",
            ErrorCode::ZoneNameExists => "Zone name already exists",
            ErrorCode::ZoneUnchanged => "Table is already in the requested zone",
            ErrorCode::TableNotInZone => "Target table is not in the requested zone",
            ErrorCode::StaffCallNotFound => "Staff call not found",
            ErrorCode::StaffCallAlreadyHandled => "Staff call has already been handled",
            ErrorCode::ZoneRequestNotFound => "Zone request not found",
            ErrorCode::ZoneRequestAlreadyDecided => "Zone request has already been decided",

            // Staff
            ErrorCode::StaffNotFound => "Staff member not found",
            ErrorCode::StaffEmailExists => "Staff email already exists",
            ErrorCode::StaffCannotDeleteSelf => "Cannot delete own account",
            ErrorCode::InvalidRole => "Invalid staff role",
            ErrorCode::CustomerNotFound => "Customer not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::UpstreamError => "Assistant service is unavailable",
            ErrorCode::GatewayError => "Payment gateway request failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::InvalidFormat,
            7 => ErrorCode::RequiredField,
            8 => ErrorCode::ValueOutOfRange,
            9 => ErrorCode::TooManyRequests,

            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            1005 => ErrorCode::SessionExpired,
            1007 => ErrorCode::AccountDisabled,
            1008 => ErrorCode::PasswordTooShort,

            2001 => ErrorCode::PermissionDenied,
            2003 => ErrorCode::ManagerRequired,
            2005 => ErrorCode::CannotDeleteOwner,

            3002 => ErrorCode::RestaurantNotFound,
            3003 => ErrorCode::EmailAlreadyRegistered,
            3010 => ErrorCode::PlanLimitReached,
            3011 => ErrorCode::NoActiveSubscription,
            3012 => ErrorCode::UnknownPlan,
            3013 => ErrorCode::SubscriptionNotFound,
            3014 => ErrorCode::SignatureInvalid,
            3017 => ErrorCode::PaymentSetupFailed,
            3020 => ErrorCode::SettingNotFound,

            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::OrderAlreadyPaid,
            4003 => ErrorCode::OrderAlreadyCompleted,
            4004 => ErrorCode::OrderCancelled,
            4007 => ErrorCode::OrderEmpty,
            4008 => ErrorCode::InvalidStatusTransition,
            4009 => ErrorCode::OrderStatusConflict,
            4010 => ErrorCode::InvalidQuantity,
            4011 => ErrorCode::ItemNotOrderable,

            5001 => ErrorCode::PaymentFailed,
            5002 => ErrorCode::PaymentInsufficientAmount,
            5003 => ErrorCode::PaymentInvalidMethod,
            5005 => ErrorCode::PaymentAmountExceeds,

            6001 => ErrorCode::MenuItemNotFound,
            6002 => ErrorCode::MenuItemInvalidPrice,
            6003 => ErrorCode::MenuItemUnavailable,

            6501 => ErrorCode::FileTooLarge,
            6502 => ErrorCode::UnsupportedFileFormat,
            6503 => ErrorCode::InvalidImageFile,
            6504 => ErrorCode::NoFileProvided,
            6505 => ErrorCode::EmptyFile,
            6506 => ErrorCode::NoFilename,
            6507 => ErrorCode::InvalidFileExtension,
            6509 => ErrorCode::FileStorageFailed,
            6510 => ErrorCode::InvalidFilePath,

            6601 => ErrorCode::InventoryItemNotFound,
            6602 => ErrorCode::InvalidInventoryQuantity,

            7001 => ErrorCode::TableNotFound,
            7002 => ErrorCode::TableInactive,
            7101 => ErrorCode::ZoneNotFound,
            7102 => ErrorCode::ZoneHasTables,
            7103 => ErrorCode::ZoneNameExists,
            7104 => ErrorCode::ZoneUnchanged,
            7105 => ErrorCode::TableNotInZone,
            7201 => ErrorCode::StaffCallNotFound,
            7202 => ErrorCode::StaffCallAlreadyHandled,
            7301 => ErrorCode::ZoneRequestNotFound,
            7302 => ErrorCode::ZoneRequestAlreadyDecided,

            8001 => ErrorCode::StaffNotFound,
            8002 => ErrorCode::StaffEmailExists,
            8003 => ErrorCode::StaffCannotDeleteSelf,
            8004 => ErrorCode::InvalidRole,
            8101 => ErrorCode::CustomerNotFound,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9003 => ErrorCode::NetworkError,
            9004 => ErrorCode::TimeoutError,
            9005 => ErrorCode::ConfigError,
            9006 => ErrorCode::UpstreamError,
            9007 => ErrorCode::GatewayError,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::SessionExpired.code(), 1005);
        assert_eq!(ErrorCode::OrderStatusConflict.code(), 4009);
        assert_eq!(ErrorCode::UnsupportedFileFormat.code(), 6502);
        assert_eq!(ErrorCode::UpstreamError.code(), 9006);
    }

    #[test]
    fn test_try_from_known_codes() {
        assert_eq!(ErrorCode::try_from(3), Ok(ErrorCode::NotFound));
        assert_eq!(ErrorCode::try_from(7202), Ok(ErrorCode::StaffCallAlreadyHandled));
        assert_eq!(ErrorCode::try_from(3014), Ok(ErrorCode::SignatureInvalid));
    }

    #[test]
    fn test_try_from_matches_repr() {
        // Every code that parses must map back onto the same number
        for value in 0u16..10_000 {
            if let Ok(code) = ErrorCode::try_from(value) {
                assert_eq!(code.code(), value, "{code:?}");
            }
        }
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::ItemNotOrderable).unwrap(),
            "4011"
        );
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            ErrorCode::PasswordTooShort.message(),
            "Password must be at least 8 characters"
        );
    }
}
