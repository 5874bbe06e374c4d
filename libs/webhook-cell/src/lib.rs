pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod subscriptions;
pub mod worker;

pub use dispatcher::{QueuedEvent, WebhookDispatcher};
pub use error::WebhookError;
pub use subscriptions::{generate_secret, SubscriptionService};
pub use worker::WorkerPool;
