//! `From<CellError> for ApiError` can't be implemented on this boundary
//! directly (`ApiError` and every cell error are both foreign to this
//! crate, so the orphan rule blocks it) — these free functions do the same
//! job explicitly, one per cell, feeding `.map_err(..)?` in the handlers.

use shared_models::{ApiError, ConflictReason};

pub fn map_registry(err: registry_cell::RegistryError) -> ApiError {
    use registry_cell::RegistryError::*;
    match err {
        NotFound => ApiError::NotFound("store not found".into()),
        BadTimezone(_) | AmbiguousLocalTime(_) => ApiError::Validation(err.to_string()),
    }
}

pub fn map_catalog(err: catalog_cell::CatalogError) -> ApiError {
    use catalog_cell::CatalogError::*;
    match err {
        TreatmentNotFound => ApiError::NotFound("treatment not found".into()),
        ResourceNotFound => ApiError::NotFound("resource not found".into()),
        StaffNotFound => ApiError::NotFound("staff member not found".into()),
        ResourceNotInStore(_, _) => ApiError::Validation(err.to_string()),
        TreatmentInUse => ApiError::Validation(err.to_string()),
    }
}

pub fn map_timeslot(err: timeslot_cell::TimeslotError) -> ApiError {
    use timeslot_cell::TimeslotError::*;
    match err {
        StoreNotFound => ApiError::NotFound("store not found".into()),
        NotFound => ApiError::NotFound("timeslot not found".into()),
        Registry(e) => map_registry(e),
        RegenerationConflict(_) => ApiError::Conflict(ConflictReason::TimeslotRegenerationConflict),
    }
}

pub fn map_reservation(err: reservation_cell::ReservationError) -> ApiError {
    use reservation_cell::ReservationError::*;
    match err {
        StoreNotFound => ApiError::NotFound("store not found".into()),
        BookingNotFound => ApiError::NotFound("booking not found".into()),
        Catalog(e) => map_catalog(e),
        Timeslot(e) => map_timeslot(e),
        Registry(e) => map_registry(e),
        Conflict(reason) => ApiError::Conflict(reason),
        InvalidTransition { from, to } => {
            ApiError::Validation(format!("cannot transition booking from {:?} to {:?}", from, to))
        }
        CancellationWindowClosed => ApiError::Validation("cancellation deadline has passed".into()),
    }
}

pub fn map_webhook(err: webhook_cell::WebhookError) -> ApiError {
    match err {
        webhook_cell::WebhookError::NotFound => ApiError::NotFound("webhook subscription not found".into()),
    }
}
