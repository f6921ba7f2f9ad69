//! Fixed-locale wall clock.
//!
//! The service runs in a single locale, UTC+08:00 with no daylight saving.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Offset of the service locale from UTC, in seconds.
pub const LOCAL_UTC_OFFSET_SECS: i64 = 8 * 3600;

/// Convert a UTC instant to local wall-clock time.
pub fn to_local(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc() + TimeDelta::seconds(LOCAL_UTC_OFFSET_SECS)
}

/// Current local wall-clock time.
pub fn local_now() -> NaiveDateTime {
    to_local(Utc::now())
}

/// Current local calendar date.
pub fn local_today() -> NaiveDate {
    local_now().date()
}
