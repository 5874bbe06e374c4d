//! The booking status state machine (§4.4). Grounded on
//! `appointment-cell/src/services/lifecycle.rs`'s `get_valid_transitions`
//! match-table idiom, generalized from that crate's seven-status domain to
//! the six statuses in §3.

use chrono::{DateTime, Duration, Utc};
use shared_models::BookingStatus;

/// Forward transitions `ReservationService::transition` is allowed to apply.
/// Cancellation is deliberately absent here — it goes through
/// `ReservationService::cancel_booking`, which carries its own deadline rule
/// rather than a plain current-status check.
pub fn valid_transitions(
    current: BookingStatus,
    booking_date_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<BookingStatus> {
    match current {
        BookingStatus::Pending => {
            let mut next = vec![BookingStatus::Confirmed];
            if now >= booking_date_time {
                next.push(BookingStatus::NoShow);
            }
            next
        }
        BookingStatus::Confirmed => {
            let mut next = Vec::new();
            if now >= booking_date_time {
                next.push(BookingStatus::InProgress);
                next.push(BookingStatus::NoShow);
            }
            next
        }
        BookingStatus::InProgress => vec![BookingStatus::Completed],
        BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow => Vec::new(),
    }
}

/// Modifiable (§4.4): only a `pending`/`confirmed` booking whose time has
/// not yet passed can be rescheduled.
pub fn is_modifiable(status: BookingStatus, booking_date_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Confirmed) && booking_date_time > now
}

/// Cancellable (§4.4): any non-terminal booking, provided the store's
/// cancellation deadline hasn't passed.
pub fn is_cancellable(
    status: BookingStatus,
    booking_date_time: DateTime<Utc>,
    now: DateTime<Utc>,
    cancellation_deadline_hours: i64,
) -> bool {
    status.is_non_terminal() && (booking_date_time - now) >= Duration::hours(cancellation_deadline_hours)
}
