//! Pure policy functions over `Store` (§4.1): no I/O beyond the reads the
//! caller already performed. Timezone handling follows
//! `examples/other_examples/.../availability-engine.rs.rs`'s
//! `Tz::from_local_datetime(&naive).single()` idiom — the only
//! DST-correct way to turn a store-local wall-clock time into a UTC instant.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared_models::{DaySchedule, Store};

use crate::error::RegistryError;

pub fn resolve_timezone(store: &Store) -> Result<Tz, RegistryError> {
    store
        .timezone
        .parse()
        .map_err(|_| RegistryError::BadTimezone(store.timezone.clone()))
}

/// `IsOpenOnDate(store, localDate)` (§4.1): false if the day is absent from
/// `operatingHours` or marked closed.
pub fn is_open_on_date(store: &Store, local_date: NaiveDate) -> bool {
    operating_hours_for_date(store, local_date).is_some()
}

/// `OperatingHoursForDate(store, localDate)` (§4.1).
pub fn operating_hours_for_date(store: &Store, local_date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
    match store.operating_hours.get(&local_date.weekday()) {
        Some(DaySchedule::Open { open, close }) => Some((*open, *close)),
        Some(DaySchedule::Closed) | None => None,
    }
}

/// `IsOpenNow(store)` (§4.1): evaluated against the store's current local
/// wall-clock time.
pub fn is_open_now(store: &Store, now: DateTime<Utc>) -> Result<bool, RegistryError> {
    let tz = resolve_timezone(store)?;
    let local_now = now.with_timezone(&tz);
    let local_date = local_now.date_naive();
    let local_time = local_now.time();

    Ok(match operating_hours_for_date(store, local_date) {
        Some((open, close)) => open <= local_time && local_time <= close,
        None => false,
    })
}

/// DST-safe local wall-clock → UTC conversion (§4.1, §4.3). Returns `None`
/// only for a wall-clock time that does not exist (spring-forward gap) —
/// callers generating a contiguous slot grid are expected to simply skip
/// that slot, which is exactly how a spring-forward day ends up one slot
/// shorter (§8). A fall-back day's repeated hour is ambiguous rather than
/// nonexistent (two UTC instants share the one naive local time); resolved
/// to the earlier instant so the slot grid keeps that hour instead of
/// silently losing it.
pub fn local_to_utc(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _latest) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use shared_models::{OperatingHours, QuotaSettings};
    use uuid::Uuid;

    fn store_open_mon_9_to_5() -> Store {
        let mut hours = OperatingHours::new();
        hours.insert(
            Weekday::Mon,
            DaySchedule::Open {
                open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                close: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            },
        );
        hours.insert(Weekday::Sun, DaySchedule::Closed);
        Store {
            id: Uuid::new_v4(),
            name: "Test".into(),
            timezone: "America/New_York".into(),
            operating_hours: hours,
            settings: QuotaSettings::default(),
            is_active: true,
        }
    }

    #[test]
    fn closed_day_is_not_open() {
        let store = store_open_mon_9_to_5();
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        assert_eq!(sunday.weekday(), Weekday::Sun);
        assert!(!is_open_on_date(&store, sunday));
    }

    #[test]
    fn day_absent_from_map_is_not_open() {
        let store = store_open_mon_9_to_5();
        let tuesday = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        assert_eq!(tuesday.weekday(), Weekday::Tue);
        assert!(!is_open_on_date(&store, tuesday));
    }

    #[test]
    fn open_day_returns_hours() {
        let store = store_open_mon_9_to_5();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let hours = operating_hours_for_date(&store, monday).unwrap();
        assert_eq!(hours.0, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_yields_no_conversion() {
        // 2026-03-08 is US spring-forward; 02:30 local does not exist.
        let tz: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let gap_time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert!(local_to_utc(&tz, date, gap_time).is_none());
    }

    #[test]
    fn fall_back_ambiguous_hour_resolves_to_earlier_instant() {
        // 2026-11-01 is US fall-back; 01:30 local occurs twice (EDT then EST).
        let tz: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let ambiguous_time = NaiveTime::from_hms_opt(1, 30, 0).unwrap();
        let resolved = local_to_utc(&tz, date, ambiguous_time).expect("ambiguous hour must resolve, not drop");

        let earlier_time = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        let earlier = local_to_utc(&tz, date, earlier_time).unwrap();
        let later_time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let later = local_to_utc(&tz, date, later_time).unwrap();
        assert!(resolved > earlier && resolved < later);
    }

    #[test]
    fn ordinary_day_converts_cleanly() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 6).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(local_to_utc(&tz, date, time).is_some());
    }
}
