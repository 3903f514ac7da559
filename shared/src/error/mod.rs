//! Unified error system
//!
//! - [`ErrorCode`]: numeric codes shared with the dashboard and customer app
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: error type returned by every handler
//! - [`ApiResponse`]: `{code, message, data?, details?}` envelope
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::ItemNotOrderable, "Paneer Tikka is unavailable")
//!     .with_detail("menu_item_id", 42);
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(4011));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
