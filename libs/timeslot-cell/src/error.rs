use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeslotError {
    #[error("store not found")]
    StoreNotFound,
    #[error("timeslot not found")]
    NotFound,
    #[error(transparent)]
    Registry(#[from] registry_cell::RegistryError),
    #[error("cannot regenerate: {0} existing slot(s) still have bookings")]
    RegenerationConflict(usize),
}
