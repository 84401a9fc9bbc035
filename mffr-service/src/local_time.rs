//! Timestamp parsing and local-calendar helpers.
//!
//! Instants are kept as `DateTime<Utc>`; the configured zone only decides how
//! offset-less strings are read and where local days, weeks and months start.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Years accepted from offset-less input; `%Y` alone takes signed six-digit
/// years that sit at the edge of chrono's range.
const CALENDAR_YEARS: RangeInclusive<i32> = 1..=9999;

/// Nominal length of a settlement slot.
pub fn slot_length() -> Duration {
    Duration::minutes(15)
}

/// Parse an ISO-8601 timestamp.
///
/// Strings with an offset are taken as-is; strings without one are local
/// wall-clock time in `zone`; a bare date is local midnight.
pub fn parse_timestamp(raw: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replacen(' ', "T", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return CALENDAR_YEARS
                .contains(&naive.year())
                .then(|| localize(naive, zone));
        }
    }

    parse_local_date(&s).map(|date| start_of_day(date, zone))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_local_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| CALENDAR_YEARS.contains(&date.year()))
}

/// Resolve local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// spring-forward gap are pushed forward by an hour.
pub fn localize(naive: NaiveDateTime, zone: Tz) -> DateTime<Utc> {
    if let Some(dt) = zone.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }
    let shifted = naive
        .checked_add_signed(Duration::hours(1))
        .and_then(|later| zone.from_local_datetime(&later).earliest());
    match shifted {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// First instant of the local calendar day.
pub fn start_of_day(date: NaiveDate, zone: Tz) -> DateTime<Utc> {
    localize(date.and_time(NaiveTime::MIN), zone)
}

/// Last millisecond of the local calendar day (`23:59:59.999`). `None` for
/// the last date chrono can represent.
pub fn end_of_day(date: NaiveDate, zone: Tz) -> Option<DateTime<Utc>> {
    let next = date.succ_opt()?;
    start_of_day(next, zone).checked_sub_signed(Duration::milliseconds(1))
}
