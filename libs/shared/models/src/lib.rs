pub mod auth;
pub mod domain;
pub mod error;
pub mod events;

pub use auth::{Action, Permission, RequestContext, Role};
pub use domain::*;
pub use error::{ApiError, ConflictReason};
pub use events::{EventSink, NullEventSink};
