//! Schedule windows and the active-window rule.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::Serialize;

use crate::{Dosed, Medication};

/// Minutes before a scheduled time at which its window opens.
pub const BEFORE_MINUTES: i64 = 30;

/// Minutes after a scheduled time at which its window closes.
pub const AFTER_MINUTES: i64 = 90;

/// Part of the day a scheduled time falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    /// `[00:00, 12:00)`
    Morning,
    /// `[12:00, 18:00)`
    Afternoon,
    /// `[18:00, 24:00)`
    Evening,
}

impl DayPeriod {
    pub fn of(time: NaiveTime) -> Self {
        match time.hour() {
            0..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }

    /// Marker shown in front of the time.
    pub fn marker(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "上午",
            DayPeriod::Afternoon => "下午",
            DayPeriod::Evening => "晚上",
        }
    }
}

/// All medications due at one time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleWindow {
    /// Zero-padded `HH:MM`.
    pub time: String,
    /// `"<period> HH:MM"`, e.g. `"上午 08:00"`.
    pub label: String,
    pub medications: Vec<Medication>,
}

/// Parse a 24-hour `H:MM` or `HH:MM` string.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Format a time of day as zero-padded `HH:MM`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Group every plan time into windows, ordered by time of day.
///
/// Medications inside a window keep plan order. Times that do not parse
/// are ignored.
pub fn derive_schedule<P: Dosed>(plans: &[P]) -> Vec<ScheduleWindow> {
    let mut by_time: BTreeMap<String, (NaiveTime, Vec<Medication>)> = BTreeMap::new();

    for plan in plans {
        for raw in plan.times() {
            let Some(time) = parse_time_of_day(raw) else {
                continue;
            };
            by_time
                .entry(format_time_of_day(time))
                .or_insert_with(|| (time, Vec::new()))
                .1
                .push(plan.medication().clone());
        }
    }

    by_time
        .into_iter()
        .map(|(key, (time, medications))| ScheduleWindow {
            label: format!("{} {}", DayPeriod::of(time).marker(), key),
            time: key,
            medications,
        })
        .collect()
}

/// The window `now` falls in, if any.
///
/// A window is active when `now` lies within
/// `[target - BEFORE_MINUTES, target + AFTER_MINUTES]` for the target on
/// `now`'s calendar date, both ends inclusive. Overlapping windows resolve to
/// the earliest one in `schedule` order.
pub fn active_window(schedule: &[ScheduleWindow], now: NaiveDateTime) -> Option<&ScheduleWindow> {
    schedule.iter().find(|window| {
        let Some(time) = parse_time_of_day(&window.time) else {
            return false;
        };
        let target = now.date().and_time(time);
        let opens = target - TimeDelta::minutes(BEFORE_MINUTES);
        let closes = target + TimeDelta::minutes(AFTER_MINUTES);
        opens <= now && now <= closes
    })
}
