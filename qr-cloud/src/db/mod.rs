//! Database access layer
//!
//! One module per entity. Every query is scoped by `restaurant_id`; soft
//! deleted rows (`deleted_at IS NOT NULL`) never leave this layer.

pub mod customers;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod restaurants;
pub mod settings;
pub mod staff;
pub mod staff_calls;
pub mod subscriptions;
pub mod tables;
pub mod zone_requests;
pub mod zones;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
