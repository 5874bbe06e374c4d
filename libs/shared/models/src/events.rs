//! The seam between any cell that produces a lifecycle/availability event and
//! outbound delivery (§4.6, §6). Lives in `shared-models` (rather than
//! `reservation-cell`, which first defined it) so that `timeslot-cell` can
//! also emit `availability.changed` without depending on `reservation-cell` —
//! `reservation-cell` itself depends on `timeslot-cell`, so the reverse edge
//! would be circular.

use crate::domain::WebhookEvent;
use serde_json::Value;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: WebhookEvent, payload: Value);
}

/// Discards every event. Used by callers (and tests) that don't care about
/// webhook delivery.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: WebhookEvent, _payload: Value) {}
}
