use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use reservation_cell::CreateBookingRequest;
use serde::Deserialize;
use shared_models::{ApiError, Booking, BookingStatus};
use uuid::Uuid;

use crate::error_map::map_reservation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub store_id: Uuid,
    pub customer_id: Uuid,
    pub treatment_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub booking_date_time: DateTime<Utc>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .reservations
        .create_booking(CreateBookingRequest {
            store_id: body.store_id,
            customer_id: body.customer_id,
            treatment_id: body.treatment_id,
            staff_id: body.staff_id,
            booking_date_time: body.booking_date_time,
            notes: body.notes,
        })
        .await
        .map_err(map_reservation)?;
    Ok(Json(booking))
}

pub async fn get_booking(State(state): State<AppState>, Path(booking_id): Path<Uuid>) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.reservations.get_booking(booking_id).await.map_err(map_reservation)?))
}

#[derive(Deserialize)]
pub struct RescheduleBody {
    pub booking_date_time: DateTime<Utc>,
    #[serde(default)]
    pub staff_id: Option<Uuid>,
}

pub async fn reschedule_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<Booking>, ApiError> {
    let updated = state
        .reservations
        .reschedule_booking(booking_id, body.booking_date_time, body.staff_id)
        .await
        .map_err(map_reservation)?;
    Ok(Json(updated))
}

#[derive(Deserialize, Default)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<CancelBody>,
) -> Result<Json<Booking>, ApiError> {
    let updated = state.reservations.cancel_booking(booking_id, body.reason).await.map_err(map_reservation)?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct TransitionBody {
    pub status: BookingStatus,
}

pub async fn transition_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<Booking>, ApiError> {
    let updated = state.reservations.transition(booking_id, body.status).await.map_err(map_reservation)?;
    Ok(Json(updated))
}
