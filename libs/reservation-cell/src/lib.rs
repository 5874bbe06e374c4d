pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;

pub use engine::{CreateBookingRequest, ReservationService};
pub use error::ReservationError;
pub use events::{EventSink, NullEventSink};
