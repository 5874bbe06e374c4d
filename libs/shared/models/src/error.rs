use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

/// The admission failure taxonomy from the reservation engine's five-check
/// algorithm. Every variant maps onto a single `CONFLICT_ERROR` wire code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    #[error("treatment not found")]
    TreatmentNotFound,
    #[error("store is closed at the requested time")]
    StoreClosed,
    #[error("no timeslot covers the requested interval")]
    NoTimeslot,
    #[error("treatment concurrency limit reached")]
    TreatmentCapacity,
    #[error("staff member already has an overlapping booking")]
    StaffConflict,
    #[error("resource capacity exceeded")]
    ResourceCapacity,
    #[error("store daily booking limit reached")]
    DailyLimit,
    #[error("store concurrent booking limit reached")]
    StoreCapacity,
    #[error("booking is too far in advance")]
    TooFarInAdvance,
    #[error("staff member is not eligible for this treatment")]
    InvalidStaff,
    #[error("customer does not exist or is not active")]
    CustomerNotEligible,
    #[error("timeslot regeneration blocked by existing bookings")]
    TimeslotRegenerationConflict,
}

impl ConflictReason {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictReason::TreatmentNotFound => "TREATMENT_NOT_FOUND",
            ConflictReason::StoreClosed => "STORE_CLOSED",
            ConflictReason::NoTimeslot => "NO_TIMESLOT",
            ConflictReason::TreatmentCapacity => "TREATMENT_CAPACITY",
            ConflictReason::StaffConflict => "STAFF_CONFLICT",
            ConflictReason::ResourceCapacity => "RESOURCE_CAPACITY",
            ConflictReason::DailyLimit => "DAILY_LIMIT",
            ConflictReason::StoreCapacity => "STORE_CAPACITY",
            ConflictReason::TooFarInAdvance => "TOO_FAR_IN_ADVANCE",
            ConflictReason::InvalidStaff => "INVALID_STAFF",
            ConflictReason::CustomerNotEligible => "CUSTOMER_NOT_ELIGIBLE",
            ConflictReason::TimeslotRegenerationConflict => "TIMESLOT_REGENERATION_CONFLICT",
        }
    }
}

/// Top-level error taxonomy (§7). Every domain crate's own error enum
/// converts into this one at the boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::Authorization(_) => "AUTHORIZATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND_ERROR",
            ApiError::Conflict(_) => "CONFLICT_ERROR",
            ApiError::RateLimit => "RATE_LIMIT_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            // Internal details never leak to clients; only the log gets them.
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        if !matches!(self, ApiError::Internal(_)) {
            tracing::warn!(code = code, "{}", message);
        }

        let body = Json(json!({
            "success": false,
            "data": null,
            "error": { "code": code, "message": message },
        }));

        (status, body).into_response()
    }
}
