//! Shared types for the QR ordering platform
//!
//! Error system, domain models with their business rules, and small
//! utilities used by the server and its API clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
