//! The seam between any event-producing cell (the reservation engine, the
//! timeslot index) and this crate's worker pool: implements
//! `shared_models::EventSink` over a bounded `mpsc` channel (§12.2 — this
//! replaces `booking-queue-cell`'s Redis-backed queue).

use serde_json::Value;
use shared_models::{EventSink, WebhookEvent};
use tokio::sync::mpsc::Sender;
use tracing::warn;

pub struct QueuedEvent {
    pub event: WebhookEvent,
    pub payload: Value,
}

/// Hands an event to the worker pool without ever blocking the caller
/// (§5): a full queue drops the event rather than stalling the admission
/// transaction that produced it.
pub struct WebhookDispatcher {
    sender: Sender<QueuedEvent>,
}

impl WebhookDispatcher {
    pub fn new(sender: Sender<QueuedEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for WebhookDispatcher {
    fn emit(&self, event: WebhookEvent, payload: Value) {
        if self.sender.try_send(QueuedEvent { event, payload }).is_err() {
            warn!(event = event.as_str(), "webhook queue full or closed, dropping event");
        }
    }
}
