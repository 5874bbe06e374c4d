use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("webhook subscription not found")]
    NotFound,
}
