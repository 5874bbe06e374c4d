//! The ground-truth entity model (§3): stores, treatments, resources, staff,
//! timeslots, bookings, and webhook subscriptions. Transport-only fields
//! (createdAt/updatedAt/free-form metadata) are intentionally absent — the
//! engine never reaches into metadata bags for admission decisions (§9).

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two half-open intervals `[a_start, a_end)` and `[c_start, c_end)` overlap
/// iff `a_start < c_end AND c_start < a_end`. Touching intervals do not
/// overlap (§4.5).
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    c_start: DateTime<Utc>,
    c_end: DateTime<Utc>,
) -> bool {
    a_start < c_end && c_start < a_end
}

// ---------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySchedule {
    Closed,
    Open { open: NaiveTime, close: NaiveTime },
}

/// Wire shape is `{closed:true}` or `{open:"HH:MM", close:"HH:MM"}` (§3) —
/// not a natural fit for a derived tagged enum, so (de)serialization is
/// written by hand against this shadow struct.
#[derive(Serialize, Deserialize)]
struct DayScheduleWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    close: Option<String>,
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{}': {}", raw, e))
}

impl Serialize for DaySchedule {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            DaySchedule::Closed => DayScheduleWire { closed: Some(true), open: None, close: None },
            DaySchedule::Open { open, close } => DayScheduleWire {
                closed: None,
                open: Some(open.format("%H:%M").to_string()),
                close: Some(close.format("%H:%M").to_string()),
            },
        };
        wire.serialize(s)
    }
}

impl<'de> Deserialize<'de> for DaySchedule {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let wire = DayScheduleWire::deserialize(d)?;
        if wire.closed.unwrap_or(false) {
            return Ok(DaySchedule::Closed);
        }
        let open = wire.open.ok_or_else(|| serde::de::Error::missing_field("open"))?;
        let close = wire.close.ok_or_else(|| serde::de::Error::missing_field("close"))?;
        Ok(DaySchedule::Open {
            open: parse_hhmm(&open).map_err(serde::de::Error::custom)?,
            close: parse_hhmm(&close).map_err(serde::de::Error::custom)?,
        })
    }
}

/// Monday..Sunday keyed operating hours, in the store's local time.
pub type OperatingHours = std::collections::BTreeMap<Weekday, DaySchedule>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSettings {
    pub max_daily_bookings: Option<u32>,
    pub max_concurrent_bookings: Option<u32>,
    pub buffer_time_minutes: i64,
    pub max_advance_booking_days: i64,
    pub cancellation_deadline_hours: i64,
    pub allow_online_booking: bool,
    pub require_approval: bool,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            max_daily_bookings: None,
            max_concurrent_bookings: None,
            buffer_time_minutes: 15,
            max_advance_booking_days: 90,
            cancellation_deadline_hours: 24,
            allow_online_booking: true,
            require_approval: true,
        }
    }
}

impl QuotaSettings {
    /// Shallow merge per §6: absent keys preserve prior values, explicit
    /// `null` clears the key. Only the three named keys participate.
    pub fn merge(&mut self, patch: QuotaSettingsPatch) {
        if let Some(v) = patch.max_daily_bookings {
            self.max_daily_bookings = v;
        }
        if let Some(v) = patch.max_concurrent_bookings {
            self.max_concurrent_bookings = v;
        }
        // buffer_time_minutes has no "unset" state of its own; an explicit
        // null in the patch clears it back to the documented default.
        if let Some(v) = patch.buffer_time_minutes {
            self.buffer_time_minutes = v.unwrap_or(15);
        }
    }
}

/// `Some(None)` clears the key, `Some(Some(x))` sets it, `None` leaves it
/// untouched — the three-state shape §6's merge contract requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaSettingsPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub max_daily_bookings: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_concurrent_bookings: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub buffer_time_minutes: Option<Option<i64>>,
}

fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Ok(Some(Option::deserialize(d)?))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub operating_hours: OperatingHours,
    pub settings: QuotaSettings,
    pub is_active: bool,
}

// ---------------------------------------------------------------------
// Catalog: Treatment, Resource, Staff
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffLevel {
    Junior,
    Senior,
    Expert,
}

impl Default for StaffLevel {
    fn default() -> Self {
        StaffLevel::Junior
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredStaffLevel {
    Any,
    Level(StaffLevel),
}

impl RequiredStaffLevel {
    /// `canBePerformedBy`: `any` matches all; otherwise `S >= L` with
    /// `junior < senior < expert` (§4.2). Staff missing a skill level
    /// default to junior.
    pub fn is_satisfied_by(&self, staff_level: Option<StaffLevel>) -> bool {
        match self {
            RequiredStaffLevel::Any => true,
            RequiredStaffLevel::Level(required) => {
                staff_level.unwrap_or_default() >= *required
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub category: String,
    pub duration_minutes: i64,
    pub price: Price,
    pub required_staff_level: RequiredStaffLevel,
    pub required_resources: Vec<Uuid>,
    pub max_concurrent_bookings: u32,
    pub tags: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Room,
    Equipment,
    Tool,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub store_id: Uuid,
    pub resource_type: ResourceType,
    pub capacity: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub role: crate::auth::Role,
    pub store_id: Option<Uuid>,
    pub skill_level: Option<StaffLevel>,
    pub is_active: bool,
}

// ---------------------------------------------------------------------
// Timeslot
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: Uuid,
    pub store_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: u32,
    pub current_bookings: u32,
    pub is_active: bool,
    pub treatment_whitelist: Vec<Uuid>,
    pub staff_whitelist: Vec<Uuid>,
}

impl Timeslot {
    pub fn has_capacity(&self) -> bool {
        self.current_bookings < self.max_capacity
    }

    pub fn accepts_treatment(&self, treatment_id: Uuid) -> bool {
        self.treatment_whitelist.is_empty() || self.treatment_whitelist.contains(&treatment_id)
    }

    pub fn accepts_staff(&self, staff_id: Option<Uuid>) -> bool {
        if self.staff_whitelist.is_empty() {
            return true;
        }
        staff_id.map(|s| self.staff_whitelist.contains(&s)).unwrap_or(false)
    }

    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time <= start && self.end_time >= end
    }
}

// ---------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Terminal statuses never quota-check against and never transition
    /// further (§4.4).
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow)
    }

    pub fn is_non_terminal(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub treatment_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub booking_date_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: BookingStatus,
    pub price: Price,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
}

impl Booking {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.booking_date_time + Duration::minutes(self.duration_minutes)
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.booking_date_time, self.end_time(), start, end)
    }
}

// ---------------------------------------------------------------------
// Webhook subscriptions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    BookingCreated,
    BookingUpdated,
    BookingCancelled,
    BookingCompleted,
    AvailabilityChanged,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::BookingCreated => "booking.created",
            WebhookEvent::BookingUpdated => "booking.updated",
            WebhookEvent::BookingCancelled => "booking.cancelled",
            WebhookEvent::BookingCompleted => "booking.completed",
            WebhookEvent::AvailabilityChanged => "availability.changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionHealth {
    Disabled,
    Retrying,
    Warning,
    Inactive,
    Healthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub url: String,
    pub events: HashSet<WebhookEvent>,
    pub secret: String,
    pub is_active: bool,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
}

impl WebhookSubscription {
    pub fn wants(&self, event: WebhookEvent) -> bool {
        self.is_active && self.events.contains(&event)
    }

    /// Derived health status (§4.6), evaluated left-to-right.
    pub fn health(&self, now: DateTime<Utc>) -> SubscriptionHealth {
        if !self.is_active {
            return SubscriptionHealth::Disabled;
        }
        if self.retry_count > 0 {
            return SubscriptionHealth::Retrying;
        }
        if let Some(failed_at) = self.last_failure_at {
            if now - failed_at <= Duration::hours(24) {
                return SubscriptionHealth::Warning;
            }
        }
        match self.last_success_at {
            Some(succeeded_at) if now - succeeded_at <= Duration::hours(24) => {
                SubscriptionHealth::Healthy
            }
            _ => SubscriptionHealth::Inactive,
        }
    }

    /// On success: reset retry state (§4.6).
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_success_at = Some(now);
        self.retry_count = 0;
        self.last_failure_reason = None;
    }

    /// On failure: bump retry state and disable past the ceiling (§4.6).
    pub fn record_failure(&mut self, now: DateTime<Utc>, reason: String) {
        self.last_failure_at = Some(now);
        self.last_failure_reason = Some(reason);
        self.retry_count += 1;
        if self.retry_count >= self.max_retries {
            self.is_active = false;
        }
    }

    /// `delay = min(2^retryCount seconds, 60s)` (§4.6).
    pub fn backoff_delay(&self) -> std::time::Duration {
        let capped_exp = self.retry_count.min(6); // 2^6 = 64 already clamps past 60
        let secs = 2u64.saturating_pow(capped_exp).min(60);
        std::time::Duration::from_secs(secs)
    }
}
