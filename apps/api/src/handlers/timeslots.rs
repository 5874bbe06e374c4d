use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_models::{ApiError, Timeslot, WebhookEvent};
use uuid::Uuid;

use crate::error_map::{map_catalog, map_registry, map_timeslot};
use crate::state::AppState;

fn default_slot_duration() -> i64 {
    60
}

fn default_max_capacity() -> u32 {
    1
}

const MAX_GENERATION_RANGE_DAYS: i64 = 30;

#[derive(Deserialize)]
pub struct GenerateSlotsRequest {
    pub date: NaiveDate,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: i64,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
}

pub async fn generate_slots(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<GenerateSlotsRequest>,
) -> Result<Json<Vec<Timeslot>>, ApiError> {
    let slots = state
        .timeslots
        .generate_daily_slots(store_id, req.date, req.slot_duration_minutes, req.max_capacity)
        .await
        .map_err(map_timeslot)?;
    state.events.emit(WebhookEvent::AvailabilityChanged, json!({ "storeId": store_id, "date": req.date }));
    Ok(Json(slots))
}

#[derive(Deserialize)]
pub struct GenerateSlotsRangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: i64,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
}

/// The bulk variant of slot generation: one `GenerateDailySlots` call per
/// date in `[startDate, endDate]`, capped at 30 days so a single request
/// can't regenerate a year's worth of slots under one store lock.
pub async fn generate_slots_range(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<GenerateSlotsRangeRequest>,
) -> Result<Json<Vec<Timeslot>>, ApiError> {
    let span_days = (req.end_date - req.start_date).num_days();
    if span_days < 0 || span_days > MAX_GENERATION_RANGE_DAYS {
        return Err(ApiError::Validation(format!(
            "date range must cover between 0 and {} days",
            MAX_GENERATION_RANGE_DAYS
        )));
    }

    let mut generated = Vec::new();
    let mut date = req.start_date;
    while date <= req.end_date {
        let slots = state
            .timeslots
            .generate_daily_slots(store_id, date, req.slot_duration_minutes, req.max_capacity)
            .await
            .map_err(map_timeslot)?;
        generated.extend(slots);
        state.events.emit(WebhookEvent::AvailabilityChanged, json!({ "storeId": store_id, "date": date }));
        date += Duration::days(1);
    }
    Ok(Json(generated))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub treatment_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct AvailableSlot {
    pub timeslot_id: Uuid,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub remaining_capacity: u32,
    pub eligible_staff_ids: Vec<Uuid>,
}

fn to_available_slot(slot: &Timeslot, eligible_staff_ids: Vec<Uuid>) -> AvailableSlot {
    AvailableSlot {
        timeslot_id: slot.id,
        start_time: slot.start_time,
        end_time: slot.end_time,
        remaining_capacity: slot.max_capacity.saturating_sub(slot.current_bookings),
        eligible_staff_ids,
    }
}

/// `GET /stores/{storeId}/availability` (§6): without `treatmentId`, the
/// plain active/non-full slot list. With it, narrows to slots that accept
/// the treatment and attaches each slot's eligible staff ids.
pub async fn availability(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(q): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailableSlot>>, ApiError> {
    let Some(treatment_id) = q.treatment_id else {
        let slots = state.timeslots.find_available_for_date(store_id, q.date).await.map_err(map_timeslot)?;
        return Ok(Json(slots.iter().map(|s| to_available_slot(s, s.staff_whitelist.clone())).collect()));
    };

    let treatment = state.catalog.get_treatment(treatment_id).await.map_err(map_catalog)?;
    let store = state.registry.get(store_id).await.map_err(map_registry)?;
    let tz = registry_cell::policy::resolve_timezone(&store).map_err(map_registry)?;
    let day_start = registry_cell::policy::local_to_utc(&tz, q.date, NaiveTime::from_hms_opt(0, 0, 0).unwrap())
        .unwrap_or_else(|| q.date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    // Widest possible local day (DST fall-back), mirroring the timeslot
    // index's own day-bucketing so a late slot near midnight isn't dropped.
    let day_end = day_start + Duration::hours(25);

    let slots = state.timeslots.find_for_treatment(store_id, treatment_id, day_start, day_end).await;
    let store_staff = state.catalog.list_staff(store_id).await;

    let result = slots
        .iter()
        .filter(|s| s.has_capacity())
        .map(|s| {
            let eligible = store_staff
                .iter()
                .filter(|staff| {
                    staff.is_active
                        && treatment.required_staff_level.is_satisfied_by(staff.skill_level)
                        && s.accepts_staff(Some(staff.id))
                })
                .map(|staff| staff.id)
                .collect();
            to_available_slot(s, eligible)
        })
        .collect();
    Ok(Json(result))
}
