//! Live dashboard feed
//!
//! GET /api/admin/live streams [`LiveEvent`]s for the caller's restaurant as
//! server-sent events. The SSE event name is the event type, the data is the
//! JSON encoding of the event.

use std::convert::Infallible;

use axum::Extension;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use shared::models::LiveEvent;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::auth::StaffIdentity;
use crate::state::AppState;

pub async fn stream(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rid = identity.restaurant_id;
    tracing::info!(restaurant_id = rid, staff_id = identity.staff_id, "Live feed opened");
    let rx = state.live.subscribe(rid);
    Sse::new(events(rid, rx)).keep_alive(KeepAlive::default())
}

fn events(
    restaurant_id: i64,
    rx: broadcast::Receiver<LiveEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match to_sse(&event) {
                    Some(sse) => return Some((Ok(sse), rx)),
                    None => continue,
                },
                Err(RecvError::Lagged(skipped)) => {
                    // Dashboards refetch on the next event, dropping is fine
                    tracing::warn!(restaurant_id, skipped, "Live feed lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn to_sse(event: &LiveEvent) -> Option<Event> {
    match Event::default().event(event.event_name()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::error!(event = event.event_name(), error = %e, "Failed to encode live event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use shared::models::{StaffCall, StaffCallReason, StaffCallStatus};

    use super::*;
    use crate::live::LiveHub;

    fn call(id: i64) -> LiveEvent {
        LiveEvent::StaffCallCreated(StaffCall {
            id,
            table_id: 3,
            table_name: "T3".into(),
            reason: StaffCallReason::Bill,
            message: None,
            status: StaffCallStatus::Pending,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_at: None,
            created_at: 0,
        })
    }

    #[tokio::test]
    async fn test_events_follow_the_hub() {
        let hub = LiveHub::new();
        let stream = events(1, hub.subscribe(1));
        futures::pin_mut!(stream);

        hub.publish(1, call(7));
        hub.publish(2, call(8));
        assert!(stream.next().await.is_some());

        hub.publish(1, call(9));
        assert!(stream.next().await.is_some());
    }

    #[tokio::test]
    async fn test_stream_ends_when_hub_is_dropped() {
        let hub = LiveHub::new();
        let stream = events(1, hub.subscribe(1));
        drop(hub);
        futures::pin_mut!(stream);
        assert!(stream.next().await.is_none());
    }
}
