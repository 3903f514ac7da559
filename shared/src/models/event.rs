//! Live events pushed to staff dashboards

use serde::{Deserialize, Serialize};

use super::order::Order;
use super::staff_call::StaffCall;
use super::zone_request::ZoneRequest;

/// Event on a restaurant's live channel
///
/// Serialized as `{"type": "...", "data": {...}}`; the SSE event name is
/// the same as `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    OrderCreated(Order),
    OrderUpdated(Order),
    StaffCallCreated(StaffCall),
    StaffCallUpdated(StaffCall),
    ZoneRequestCreated(ZoneRequest),
    ZoneRequestUpdated(ZoneRequest),
}

impl LiveEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            LiveEvent::OrderCreated(_) => "order_created",
            LiveEvent::OrderUpdated(_) => "order_updated",
            LiveEvent::StaffCallCreated(_) => "staff_call_created",
            LiveEvent::StaffCallUpdated(_) => "staff_call_updated",
            LiveEvent::ZoneRequestCreated(_) => "zone_request_created",
            LiveEvent::ZoneRequestUpdated(_) => "zone_request_updated",
        }
    }
}
