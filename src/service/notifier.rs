//! Fire-and-forget notification dispatch.
//!
//! The notification/email service is an external collaborator; this task
//! forwards every committed domain event to it, after the fact. Dispatch
//! failures are logged and swallowed — they can never roll back or delay
//! the core transaction that produced the event, and a lagging consumer
//! only loses old events, never blocks publishers.

use tokio::sync::broadcast;

use crate::domain::{EventBus, MarketEvent};

/// Spawns the notifier loop on the given bus. The task ends when the bus
/// is dropped.
pub fn spawn(event_bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => dispatch(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "notifier lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("notifier stopped");
    })
}

/// Hands one event to the notification boundary.
///
/// The actual template rendering and delivery live in the external
/// notification service; this core only emits the identifiers and amounts
/// the templates need.
fn dispatch(event: &MarketEvent) {
    match serde_json::to_value(event) {
        Ok(payload) => {
            tracing::info!(
                event_type = event.event_type_str(),
                %payload,
                "notification dispatched"
            );
        }
        Err(err) => {
            tracing::warn!(
                event_type = event.event_type_str(),
                error = %err,
                "notification payload serialization failed; event dropped"
            );
        }
    }
}
