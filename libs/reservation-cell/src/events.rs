//! Re-exports `shared_models::EventSink`/`NullEventSink` under this crate's
//! own path for callers that already depend on `reservation-cell` rather
//! than `shared-models` directly. The trait itself now lives in
//! `shared-models` so `timeslot-cell` can also emit events
//! (`availability.changed`, §6) without a circular dependency back onto
//! `reservation-cell`, which already depends on `timeslot-cell`.

pub use shared_models::{EventSink, NullEventSink};
