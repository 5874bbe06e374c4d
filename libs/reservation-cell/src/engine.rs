//! The Reservation Engine: the five-check admission transaction (§4.5),
//! booking CRUD, and the lifecycle transitions of §4.4. Grounded on
//! `appointment-cell/src/services/consistency.rs`'s lock-then-check-then-write
//! idiom, generalized from an HTTP distributed lock to `AppStore::lock_store`,
//! and on `conflict.rs`'s overlap-counting idiom, generalized to
//! `shared_models::intervals_overlap` via `Booking::overlaps`.

use std::sync::Arc;

use catalog_cell::CatalogService;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use shared_models::{Booking, BookingStatus, ConflictReason, Store, Timeslot, Treatment, WebhookEvent};
use shared_store::AppStore;
use timeslot_cell::TimeslotService;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReservationError;
use crate::events::EventSink;
use crate::lifecycle;

pub struct CreateBookingRequest {
    pub store_id: Uuid,
    pub customer_id: Uuid,
    pub treatment_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub booking_date_time: DateTime<Utc>,
    pub notes: Option<String>,
}

pub struct ReservationService {
    store: Arc<AppStore>,
    catalog: Arc<CatalogService>,
    timeslots: Arc<TimeslotService>,
    events: Arc<dyn EventSink>,
}

impl ReservationService {
    pub fn new(
        store: Arc<AppStore>,
        catalog: Arc<CatalogService>,
        timeslots: Arc<TimeslotService>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { store, catalog, timeslots, events }
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, ReservationError> {
        self.store.get_booking(id).await.ok_or(ReservationError::BookingNotFound)
    }

    /// `CreateBooking` (§4.5). Runs the whole admission transaction under
    /// the store's advisory lock: the five checks and the writes that follow
    /// them are serialized against any other transaction on the same store.
    pub async fn create_booking(&self, req: CreateBookingRequest) -> Result<Booking, ReservationError> {
        let _guard = self.store.lock_store(req.store_id).await;

        let store = self.store.get_store(req.store_id).await.ok_or(ReservationError::StoreNotFound)?;
        let treatment = self.catalog.get_treatment(req.treatment_id).await?;
        if treatment.store_id != req.store_id || !treatment.is_active {
            return Err(ReservationError::Conflict(ConflictReason::TreatmentNotFound));
        }

        // Precondition (§4.5): the customer named by `customerId` must exist
        // and be active. Customers are `StaffMember` rows with `role: Customer`
        // (§3), so the lookup goes through the same catalog table as staff.
        match self.catalog.get_staff(req.customer_id).await {
            Ok(customer) if customer.is_active => {}
            _ => return Err(ReservationError::Conflict(ConflictReason::CustomerNotEligible)),
        }

        let slot = self
            .admit(&store, &treatment, req.staff_id, req.booking_date_time, None)
            .await?;

        // `requireApproval` (§6) picks the initial status: gated stores hold
        // new bookings for staff sign-off, open stores confirm immediately.
        let status = if store.settings.require_approval {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: req.customer_id,
            store_id: req.store_id,
            treatment_id: req.treatment_id,
            staff_id: req.staff_id,
            booking_date_time: req.booking_date_time,
            duration_minutes: treatment.duration_minutes,
            status,
            price: treatment.price.clone(),
            notes: req.notes,
            cancellation_reason: None,
            cancelled_at: None,
            completed_at: None,
            reminder_sent: false,
        };
        self.store.put_booking(booking.clone()).await;
        self.timeslots.increment(slot.id).await?;
        info!(booking_id = %booking.id, store_id = %req.store_id, "booking created");
        self.events.emit(WebhookEvent::BookingCreated, booking_payload(&booking));
        Ok(booking)
    }

    /// `RescheduleBooking` (§4.5): re-runs the same five checks against the
    /// new time and/or staff member, excluding the booking's own prior
    /// occupancy from every count. Moves the timeslot counters only if the
    /// covering slot changes. `new_staff_id` of `None` keeps the booking's
    /// current staff assignment.
    pub async fn reschedule_booking(
        &self,
        booking_id: Uuid,
        new_date_time: DateTime<Utc>,
        new_staff_id: Option<Uuid>,
    ) -> Result<Booking, ReservationError> {
        let existing = self.get_booking(booking_id).await?;
        let _guard = self.store.lock_store(existing.store_id).await;
        let now = Utc::now();

        if !lifecycle::is_modifiable(existing.status, existing.booking_date_time, now) {
            return Err(ReservationError::InvalidTransition { from: existing.status, to: existing.status });
        }

        let store = self.store.get_store(existing.store_id).await.ok_or(ReservationError::StoreNotFound)?;
        let treatment = self.catalog.get_treatment(existing.treatment_id).await?;
        let staff_id = new_staff_id.or(existing.staff_id);

        let old_slot = self
            .timeslots
            .find_covering(existing.store_id, existing.booking_date_time, existing.end_time())
            .await;

        let new_slot = self
            .admit(&store, &treatment, staff_id, new_date_time, Some(existing.id))
            .await?;

        let mut updated = existing.clone();
        updated.booking_date_time = new_date_time;
        updated.staff_id = staff_id;
        self.store.put_booking(updated.clone()).await;

        if old_slot.as_ref().map(|s| s.id) != Some(new_slot.id) {
            if let Some(old) = old_slot {
                self.timeslots.decrement(old.id).await?;
            }
            self.timeslots.increment(new_slot.id).await?;
        }

        self.events.emit(WebhookEvent::BookingUpdated, booking_payload(&updated));
        Ok(updated)
    }

    /// `CancelBooking` (§4.4, §4.5): idempotent — cancelling an already
    /// terminal booking is a no-op success, not an error (§8).
    pub async fn cancel_booking(&self, booking_id: Uuid, reason: Option<String>) -> Result<Booking, ReservationError> {
        let existing = self.get_booking(booking_id).await?;
        let _guard = self.store.lock_store(existing.store_id).await;

        if existing.status.is_terminal() {
            return Ok(existing);
        }

        let store = self.store.get_store(existing.store_id).await.ok_or(ReservationError::StoreNotFound)?;
        let now = Utc::now();
        if !lifecycle::is_cancellable(
            existing.status,
            existing.booking_date_time,
            now,
            store.settings.cancellation_deadline_hours,
        ) {
            return Err(ReservationError::CancellationWindowClosed);
        }

        let mut updated = existing.clone();
        updated.status = BookingStatus::Cancelled;
        updated.cancellation_reason = reason;
        updated.cancelled_at = Some(now);
        self.store.put_booking(updated.clone()).await;
        self.release_slot(&existing).await?;

        self.events.emit(WebhookEvent::BookingCancelled, booking_payload(&updated));
        Ok(updated)
    }

    /// Drives the non-cancellation transitions of §4.4:
    /// `confirmed`/`in_progress`/`completed`/`no_show`.
    pub async fn transition(&self, booking_id: Uuid, to: BookingStatus) -> Result<Booking, ReservationError> {
        let existing = self.get_booking(booking_id).await?;
        let _guard = self.store.lock_store(existing.store_id).await;
        let now = Utc::now();

        if !lifecycle::valid_transitions(existing.status, existing.booking_date_time, now).contains(&to) {
            return Err(ReservationError::InvalidTransition { from: existing.status, to });
        }

        let mut updated = existing.clone();
        updated.status = to;
        if to == BookingStatus::Completed {
            updated.completed_at = Some(now);
        }
        self.store.put_booking(updated.clone()).await;

        if to.is_terminal() {
            self.release_slot(&existing).await?;
        }

        let event = if to == BookingStatus::Completed {
            WebhookEvent::BookingCompleted
        } else {
            WebhookEvent::BookingUpdated
        };
        self.events.emit(event, booking_payload(&updated));
        Ok(updated)
    }

    /// Releases the timeslot a booking was holding back to the pool.
    /// Keeps `Timeslot.currentBookings` equal to the live count of
    /// non-terminal bookings covered by that slot (§4.3, §8).
    async fn release_slot(&self, booking: &Booking) -> Result<(), ReservationError> {
        if let Some(slot) = self
            .timeslots
            .find_covering(booking.store_id, booking.booking_date_time, booking.end_time())
            .await
        {
            self.timeslots.decrement(slot.id).await?;
        }
        Ok(())
    }

    /// The five-check admission transaction (§4.5). Caller must already hold
    /// `store.id`'s advisory lock. `exclude_booking_id` is `Some` only when
    /// re-validating a reschedule against the booking it is replacing.
    async fn admit(
        &self,
        store: &Store,
        treatment: &Treatment,
        staff_id: Option<Uuid>,
        booking_date_time: DateTime<Utc>,
        exclude_booking_id: Option<Uuid>,
    ) -> Result<Timeslot, ReservationError> {
        let now = Utc::now();
        let start = booking_date_time;
        let end = start + Duration::minutes(treatment.duration_minutes);

        let tz = registry_cell::policy::resolve_timezone(store)?;
        let local_date = start.with_timezone(&tz).date_naive();
        if !registry_cell::policy::is_open_on_date(store, local_date) {
            return Err(ReservationError::Conflict(ConflictReason::StoreClosed));
        }
        if start < now {
            return Err(ReservationError::Conflict(ConflictReason::TooFarInAdvance));
        }
        if (start - now).num_days() > store.settings.max_advance_booking_days {
            return Err(ReservationError::Conflict(ConflictReason::TooFarInAdvance));
        }
        if let Some(sid) = staff_id {
            if !self.catalog.staff_is_eligible(treatment, sid).await? {
                return Err(ReservationError::Conflict(ConflictReason::InvalidStaff));
            }
        }

        // Check 1: timeslot gate, earliest start wins among covering slots.
        let slot = self
            .timeslots
            .find_admissible(store.id, treatment.id, staff_id, start, end)
            .await
            .ok_or(ReservationError::Conflict(ConflictReason::NoTimeslot))?;

        // Check 2: treatment concurrency.
        let treatment_overlaps = self
            .store
            .bookings_for_treatment(treatment.id)
            .await
            .into_iter()
            .filter(|b| Some(b.id) != exclude_booking_id && b.status.is_non_terminal() && b.overlaps(start, end))
            .count() as u32;
        if treatment_overlaps >= treatment.max_concurrent_bookings {
            return Err(ReservationError::Conflict(ConflictReason::TreatmentCapacity));
        }

        // Check 3: staff conflict (a staff member can't hold two overlapping
        // bookings regardless of which treatments they're for).
        if let Some(sid) = staff_id {
            let staff_conflict = self
                .store
                .bookings_for_staff(sid)
                .await
                .into_iter()
                .any(|b| Some(b.id) != exclude_booking_id && b.status.is_non_terminal() && b.overlaps(start, end));
            if staff_conflict {
                return Err(ReservationError::Conflict(ConflictReason::StaffConflict));
            }
        }

        // Check 4: resource conflict, per required resource, against every
        // other overlapping booking whose own treatment also needs it.
        let store_bookings = self.store.bookings_for_store(store.id).await;
        for resource_id in &treatment.required_resources {
            let resource = self.catalog.get_resource(*resource_id).await?;
            let mut concurrent = 0u32;
            for b in &store_bookings {
                if Some(b.id) == exclude_booking_id || b.status.is_terminal() || !b.overlaps(start, end) {
                    continue;
                }
                let other_treatment = self.catalog.get_treatment(b.treatment_id).await?;
                if other_treatment.required_resources.contains(resource_id) {
                    concurrent += 1;
                }
            }
            if concurrent >= resource.capacity {
                return Err(ReservationError::Conflict(ConflictReason::ResourceCapacity));
            }
        }

        // Check 5: store-wide daily and concurrent quotas.
        if let Some(max_daily) = store.settings.max_daily_bookings {
            let same_day = store_bookings
                .iter()
                .filter(|b| {
                    Some(b.id) != exclude_booking_id
                        && b.status.is_non_terminal()
                        && b.booking_date_time.with_timezone(&tz).date_naive() == local_date
                })
                .count() as u32;
            if same_day >= max_daily {
                return Err(ReservationError::Conflict(ConflictReason::DailyLimit));
            }
        }
        if let Some(max_concurrent) = store.settings.max_concurrent_bookings {
            let concurrent = store_bookings
                .iter()
                .filter(|b| Some(b.id) != exclude_booking_id && b.status.is_non_terminal() && b.overlaps(start, end))
                .count() as u32;
            if concurrent >= max_concurrent {
                warn!(store_id = %store.id, "store concurrent booking quota reached");
                return Err(ReservationError::Conflict(ConflictReason::StoreCapacity));
            }
        }

        Ok(slot)
    }
}

fn booking_payload(booking: &Booking) -> Value {
    json!({
        "id": booking.id,
        "storeId": booking.store_id,
        "customerId": booking.customer_id,
        "treatmentId": booking.treatment_id,
        "staffId": booking.staff_id,
        "bookingDateTime": booking.booking_date_time,
        "status": booking.status,
        "price": { "amount": booking.price.amount, "currency": booking.price.currency },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use shared_models::{
        DaySchedule, OperatingHours, Price, QuotaSettings, RequiredStaffLevel, Resource, ResourceType, Role,
        StaffLevel, StaffMember,
    };
    use timeslot_cell::TimeslotService;

    struct Fixture {
        app: Arc<AppStore>,
        reservation: ReservationService,
        store_id: Uuid,
        treatment: Treatment,
        customer_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let app = Arc::new(AppStore::new());
        let catalog = Arc::new(CatalogService::new(app.clone()));
        let timeslots = Arc::new(TimeslotService::new(app.clone()));

        let mut hours = OperatingHours::new();
        hours.insert(
            Weekday::Mon,
            DaySchedule::Open {
                open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                close: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            },
        );
        let store = Store {
            id: Uuid::new_v4(),
            name: "Test Store".into(),
            timezone: "America/New_York".into(),
            operating_hours: hours,
            settings: QuotaSettings { require_approval: false, ..QuotaSettings::default() },
            is_active: true,
        };
        let store_id = store.id;
        app.put_store(store).await;

        let treatment = Treatment {
            id: Uuid::new_v4(),
            store_id,
            name: "Swedish Massage".into(),
            category: "massage".into(),
            duration_minutes: 60,
            price: Price { amount: 9000, currency: "USD".into() },
            required_staff_level: RequiredStaffLevel::Any,
            required_resources: vec![],
            max_concurrent_bookings: 1,
            tags: vec![],
            is_active: true,
        };
        catalog.create_treatment(treatment.clone()).await.unwrap();

        let customer = StaffMember {
            id: Uuid::new_v4(),
            role: Role::Customer,
            store_id: None,
            skill_level: None,
            is_active: true,
        };
        let customer_id = customer.id;
        app.put_staff(customer).await;

        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        assert_eq!(monday.weekday(), Weekday::Mon);
        timeslots.generate_daily_slots(store_id, monday, 60, 1).await.unwrap();

        let reservation = ReservationService::new(app.clone(), catalog, timeslots, Arc::new(crate::events::NullEventSink));
        Fixture { app, reservation, store_id, treatment, customer_id }
    }

    fn slot_start(local_date: NaiveDate, hour: u32) -> DateTime<Utc> {
        let tz: chrono_tz::Tz = "America/New_York".parse().unwrap();
        registry_cell::policy::local_to_utc(&tz, local_date, NaiveTime::from_hms_opt(hour, 0, 0).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn create_booking_confirms_immediately_when_approval_not_required() {
        let f = fixture().await;
        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        let booking = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.duration_minutes, 60);
        assert_eq!(booking.price.amount, 9000);
    }

    #[tokio::test]
    async fn unknown_customer_is_rejected_before_admission() {
        let f = fixture().await;
        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        let result = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: Uuid::new_v4(),
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ReservationError::Conflict(ConflictReason::CustomerNotEligible))));
    }

    #[tokio::test]
    async fn inactive_customer_is_rejected() {
        let f = fixture().await;
        let inactive_customer =
            StaffMember { id: Uuid::new_v4(), role: Role::Customer, store_id: None, skill_level: None, is_active: false };
        f.app.put_staff(inactive_customer.clone()).await;

        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        let result = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: inactive_customer.id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ReservationError::Conflict(ConflictReason::CustomerNotEligible))));
    }

    #[tokio::test]
    async fn second_overlapping_booking_hits_no_timeslot_once_slot_is_full() {
        let f = fixture().await;
        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        f.reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();

        let result = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ReservationError::Conflict(ConflictReason::NoTimeslot))));
    }

    #[tokio::test]
    async fn staff_conflict_blocks_double_booking_same_staff() {
        let f = fixture().await;
        let staff = StaffMember {
            id: Uuid::new_v4(),
            role: Role::Staff,
            store_id: Some(f.store_id),
            skill_level: Some(StaffLevel::Senior),
            is_active: true,
        };
        f.app.put_staff(staff.clone()).await;

        // A second timeslot covering the same hour lets the slot gate pass
        // twice so the staff-conflict check is what actually fires.
        let slot = f.app.timeslots_for_store(f.store_id).await.into_iter().next().unwrap();
        let mut twin = slot.clone();
        twin.id = Uuid::new_v4();
        f.app.put_timeslot(twin).await;

        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        f.reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: Some(staff.id),
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();

        let result = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: Some(staff.id),
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ReservationError::Conflict(ConflictReason::StaffConflict))));
    }

    #[tokio::test]
    async fn cancel_releases_the_slot_for_reuse() {
        let f = fixture().await;
        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        let booking = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();

        f.reservation.cancel_booking(booking.id, Some("plans changed".into())).await.unwrap();

        let rebooked = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(rebooked.is_ok());
    }

    #[tokio::test]
    async fn cancel_is_idempotent_on_an_already_terminal_booking() {
        let f = fixture().await;
        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        let booking = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: f.treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();

        let first = f.reservation.cancel_booking(booking.id, None).await.unwrap();
        let second = f.reservation.cancel_booking(booking.id, None).await.unwrap();
        assert_eq!(first.status, BookingStatus::Cancelled);
        assert_eq!(second.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn resource_capacity_blocks_a_third_booking_on_a_single_room() {
        let f = fixture().await;
        let room = Resource { id: Uuid::new_v4(), store_id: f.store_id, resource_type: ResourceType::Room, capacity: 1, is_active: true };
        f.app.put_resource(room.clone()).await;

        let mut treatment = f.treatment.clone();
        treatment.id = Uuid::new_v4();
        treatment.required_resources = vec![room.id];
        treatment.max_concurrent_bookings = 5; // isolate the resource check from the treatment check
        let catalog = CatalogService::new(f.app.clone());
        catalog.create_treatment(treatment.clone()).await.unwrap();

        // Two timeslots so the slot gate doesn't block the second attempt.
        let slot = f.app.timeslots_for_store(f.store_id).await.into_iter().next().unwrap();
        let mut twin = slot.clone();
        twin.id = Uuid::new_v4();
        f.app.put_timeslot(twin).await;

        let start = slot_start(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(), 10);
        f.reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await
            .unwrap();

        let result = f
            .reservation
            .create_booking(CreateBookingRequest {
                store_id: f.store_id,
                customer_id: f.customer_id,
                treatment_id: treatment.id,
                staff_id: None,
                booking_date_time: start,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ReservationError::Conflict(ConflictReason::ResourceCapacity))));
    }
}
