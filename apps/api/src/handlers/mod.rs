pub mod bookings;
pub mod catalog;
pub mod stores;
pub mod timeslots;
pub mod webhooks;
