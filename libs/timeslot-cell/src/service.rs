//! The Timeslot Index (§4.3): grid generation from a store's operating hours,
//! lookup, and the only code path permitted to mutate `currentBookings`.
//! Grounded on `doctor-cell/src/services/availability.rs`'s
//! `calculate_slots_for_schedule`/`remove_overlapping_slots` idiom, generalized
//! from a per-doctor recurring-schedule grid to a per-store fixed-duration grid,
//! and on `registry-cell`'s DST-safe `local_to_utc` for the boundary conversions.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use shared_models::Timeslot;
use shared_store::AppStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::TimeslotError;

pub struct TimeslotService {
    store: Arc<AppStore>,
}

impl TimeslotService {
    pub fn new(store: Arc<AppStore>) -> Self {
        Self { store }
    }

    /// `GenerateDailySlots` (§4.3). Holds the store's advisory lock for the
    /// full delete-then-insert sequence so a concurrent regeneration for an
    /// overlapping range is serialized (§4.3 point 4, §5).
    pub async fn generate_daily_slots(
        &self,
        store_id: Uuid,
        local_date: NaiveDate,
        slot_duration_minutes: i64,
        max_capacity: u32,
    ) -> Result<Vec<Timeslot>, TimeslotError> {
        let _guard = self.store.lock_store(store_id).await;

        let store = self.store.get_store(store_id).await.ok_or(TimeslotError::StoreNotFound)?;
        let tz = registry_cell::policy::resolve_timezone(&store)?;

        let Some((open, close)) = registry_cell::policy::operating_hours_for_date(&store, local_date) else {
            debug!(store_id = %store_id, date = %local_date, "store closed, generating no slots");
            return Ok(vec![]);
        };

        let existing = self.slots_on_local_date(store_id, &store, local_date).await?;
        let referenced = existing.iter().filter(|s| s.current_bookings > 0).count();
        if referenced > 0 {
            warn!(store_id = %store_id, date = %local_date, referenced, "regeneration blocked by existing bookings");
            return Err(TimeslotError::RegenerationConflict(referenced));
        }

        for slot in &existing {
            self.store.remove_timeslot(slot.id).await;
        }

        let step = Duration::minutes(slot_duration_minutes);
        let mut slots = Vec::new();
        let mut cursor = open;
        while let Some(next) = cursor.checked_add_signed(step) {
            if next > close {
                break;
            }
            let Some(start_utc) = registry_cell::policy::local_to_utc(&tz, local_date, cursor) else {
                // Wall-clock start falls in a spring-forward gap; skip this slot (§8).
                cursor = next;
                continue;
            };
            // The end boundary is derived by duration, not a second local-time
            // lookup: on a spring-forward day the wall-clock "next" may itself
            // sit inside the gap even though the slot's real-time extent is
            // perfectly well defined as `start_utc + step`.
            let end_utc = start_utc + step;

            let slot = Timeslot {
                id: Uuid::new_v4(),
                store_id,
                start_time: start_utc,
                end_time: end_utc,
                max_capacity,
                current_bookings: 0,
                is_active: true,
                treatment_whitelist: vec![],
                staff_whitelist: vec![],
            };
            self.store.put_timeslot(slot.clone()).await;
            slots.push(slot);
            cursor = next;
        }

        info!(store_id = %store_id, date = %local_date, count = slots.len(), "timeslots generated");
        Ok(slots)
    }

    async fn slots_on_local_date(
        &self,
        store_id: Uuid,
        store: &shared_models::Store,
        local_date: NaiveDate,
    ) -> Result<Vec<Timeslot>, TimeslotError> {
        let tz = registry_cell::policy::resolve_timezone(store)?;
        let day_start = registry_cell::policy::local_to_utc(
            &tz,
            local_date,
            chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        )
        .unwrap_or_else(|| local_date.and_hms_opt(0, 0, 0).unwrap().and_utc());
        let day_end = day_start + Duration::hours(25); // widest possible local day (DST fall-back)

        Ok(self
            .store
            .timeslots_for_store(store_id)
            .await
            .into_iter()
            .filter(|s| s.start_time >= day_start && s.start_time < day_end)
            .collect())
    }

    /// `FindAvailableForDate` (§4.3): active, non-full timeslots in the
    /// store's local day, ordered by start.
    pub async fn find_available_for_date(
        &self,
        store_id: Uuid,
        local_date: NaiveDate,
    ) -> Result<Vec<Timeslot>, TimeslotError> {
        let store = self.store.get_store(store_id).await.ok_or(TimeslotError::StoreNotFound)?;
        let mut slots = self.slots_on_local_date(store_id, &store, local_date).await?;
        slots.retain(|s| s.is_active && s.has_capacity());
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    /// `FindForTreatment` (§4.3): additionally requires the slot's whitelist
    /// to accept the treatment.
    pub async fn find_for_treatment(
        &self,
        store_id: Uuid,
        treatment_id: Uuid,
        start_range: DateTime<Utc>,
        end_range: DateTime<Utc>,
    ) -> Vec<Timeslot> {
        let mut slots: Vec<Timeslot> = self
            .store
            .timeslots_for_store(store_id)
            .await
            .into_iter()
            .filter(|s| {
                s.is_active
                    && s.accepts_treatment(treatment_id)
                    && s.start_time >= start_range
                    && s.end_time <= end_range
            })
            .collect();
        slots.sort_by_key(|s| s.start_time);
        slots
    }

    /// The single slot whose boundaries cover `[start, end)`, regardless of
    /// capacity or whitelist — used to find the slot a booking already holds
    /// when cancelling, completing, or rescheduling it (§4.5).
    pub async fn find_covering(
        &self,
        store_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Timeslot> {
        self.store
            .timeslots_for_store(store_id)
            .await
            .into_iter()
            .find(|s| s.covers(start, end))
    }

    /// Check 1 of the admission algorithm (§4.5): the earliest-starting
    /// active slot that covers the interval, has capacity, and whitelists
    /// this treatment/staff member.
    pub async fn find_admissible(
        &self,
        store_id: Uuid,
        treatment_id: Uuid,
        staff_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Timeslot> {
        let mut candidates: Vec<Timeslot> = self
            .store
            .timeslots_for_store(store_id)
            .await
            .into_iter()
            .filter(|s| {
                s.is_active
                    && s.covers(start, end)
                    && s.has_capacity()
                    && s.accepts_treatment(treatment_id)
                    && s.accepts_staff(staff_id)
            })
            .collect();
        candidates.sort_by_key(|s| s.start_time);
        candidates.into_iter().next()
    }

    /// Counter mutation (§4.3): only ever called from inside the reservation
    /// engine's admission transaction, with the store lock already held.
    pub async fn increment(&self, slot_id: Uuid) -> Result<Timeslot, TimeslotError> {
        let mut slot = self.store.get_timeslot(slot_id).await.ok_or(TimeslotError::NotFound)?;
        slot.current_bookings = (slot.current_bookings + 1).min(slot.max_capacity);
        self.store.put_timeslot(slot.clone()).await;
        Ok(slot)
    }

    /// Decrement clamps at zero — idempotent under double-cancel (§5, §8).
    pub async fn decrement(&self, slot_id: Uuid) -> Result<Timeslot, TimeslotError> {
        let mut slot = self.store.get_timeslot(slot_id).await.ok_or(TimeslotError::NotFound)?;
        slot.current_bookings = slot.current_bookings.saturating_sub(1);
        self.store.put_timeslot(slot.clone()).await;
        Ok(slot)
    }
}
