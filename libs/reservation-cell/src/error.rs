use shared_models::{BookingStatus, ConflictReason};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("store not found")]
    StoreNotFound,
    #[error("booking not found")]
    BookingNotFound,
    #[error(transparent)]
    Catalog(#[from] catalog_cell::CatalogError),
    #[error(transparent)]
    Timeslot(#[from] timeslot_cell::TimeslotError),
    #[error(transparent)]
    Registry(#[from] registry_cell::RegistryError),
    #[error("admission rejected: {0}")]
    Conflict(ConflictReason),
    #[error("cannot transition booking from {from:?} to {to:?}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },
    #[error("cancellation deadline has passed")]
    CancellationWindowClosed,
}
