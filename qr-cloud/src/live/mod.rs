//! LiveHub: per-restaurant event fan-out to staff dashboards
//!
//! ```text
//! order / staff call / zone request handlers
//!       │ LiveEvent
//!       ▼
//! LiveHub
//!   └── restaurants: restaurant_id → broadcast::Sender<LiveEvent>
//!           │
//!           ▼
//!   GET /api/admin/live (SSE, one receiver per open dashboard)
//! ```
//!
//! Channels are strictly per restaurant; a dashboard only ever subscribes to
//! the restaurant in its staff token.

use dashmap::DashMap;
use shared::models::LiveEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Enough to absorb a burst while a dashboard reconnects
const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub struct LiveHub {
    restaurants: Arc<DashMap<i64, broadcast::Sender<LiveEvent>>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish to every dashboard of `restaurant_id`. Nobody listening is fine.
    pub fn publish(&self, restaurant_id: i64, event: LiveEvent) {
        if let Some(tx) = self.restaurants.get(&restaurant_id) {
            let name = event.event_name();
            let delivered = tx.send(event).unwrap_or(0);
            tracing::debug!(restaurant_id, event = name, delivered, "Live event published");
        }
    }

    pub fn subscribe(&self, restaurant_id: i64) -> broadcast::Receiver<LiveEvent> {
        self.restaurants
            .entry(restaurant_id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Drop channels whose dashboards have all disconnected
    pub fn prune(&self) {
        self.restaurants.retain(|_, tx| tx.receiver_count() > 0);
    }

    pub fn channel_count(&self) -> usize {
        self.restaurants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ZoneRequest, ZoneRequestStatus};

    fn event(id: i64) -> LiveEvent {
        LiveEvent::ZoneRequestCreated(ZoneRequest {
            id,
            table_id: 1,
            table_name: "T1".into(),
            current_zone_id: None,
            requested_zone_id: 2,
            reason: None,
            status: ZoneRequestStatus::Pending,
            target_table_id: None,
            decided_by: None,
            decided_at: None,
            created_at: 0,
        })
    }

    fn id_of(e: &LiveEvent) -> i64 {
        match e {
            LiveEvent::ZoneRequestCreated(r) => r.id,
            _ => -1,
        }
    }

    #[tokio::test]
    async fn restaurant_isolation() {
        let hub = LiveHub::new();
        let mut a = hub.subscribe(1);
        let mut b = hub.subscribe(2);

        hub.publish(1, event(10));
        hub.publish(2, event(20));

        assert_eq!(id_of(&a.recv().await.unwrap()), 10);
        assert_eq!(id_of(&b.recv().await.unwrap()), 20);
        assert!(a.try_recv().is_err());
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn fan_out_to_every_dashboard() {
        let hub = LiveHub::new();
        let mut first = hub.subscribe(1);
        let mut second = hub.subscribe(1);
        hub.publish(1, event(5));
        assert_eq!(id_of(&first.recv().await.unwrap()), 5);
        assert_eq!(id_of(&second.recv().await.unwrap()), 5);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let hub = LiveHub::new();
        hub.publish(9, event(1));
        assert_eq!(hub.channel_count(), 0);
    }

    #[test]
    fn prune_drops_idle_channels() {
        let hub = LiveHub::new();
        let rx = hub.subscribe(1);
        let _keep = hub.subscribe(2);
        drop(rx);
        hub.prune();
        assert_eq!(hub.channel_count(), 1);
    }
}
