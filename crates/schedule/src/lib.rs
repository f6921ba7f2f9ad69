//! Medication schedule derivation.
//!
//! Turns a set of medication plans into the ordered list of times-of-day at
//! which something is due, and decides which of those times (if any) is the
//! one the elderly person should be reminded about right now.
//!
//! Everything here is pure: identical inputs give identical outputs and no
//! function reads the clock unless it says so in its name.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use schedule::{active_window, derive_schedule, Medication, PlanTimes};
//!
//! let plans = vec![PlanTimes {
//!     medication: Medication::new("Amlodipine", 1, Some("tablet")),
//!     times: vec!["08:00".to_string(), "20:00".to_string()],
//! }];
//!
//! let schedule = derive_schedule(&plans);
//! assert_eq!(schedule.len(), 2);
//!
//! let now = NaiveDate::from_ymd_opt(2024, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(7, 45, 0)
//!     .unwrap();
//! assert_eq!(active_window(&schedule, now).unwrap().time, "08:00");
//! ```

pub mod clock;
pub mod window;

pub use clock::{local_now, local_today, to_local};
pub use window::{
    active_window, derive_schedule, format_time_of_day, parse_time_of_day, DayPeriod,
    ScheduleWindow, AFTER_MINUTES, BEFORE_MINUTES,
};

use serde::{Deserialize, Serialize};

/// One medication and its dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Drug name as entered by the family.
    pub name: String,
    /// Number of units per dose.
    pub quantity: i64,
    /// Free-text unit ("tablet", "ml", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Medication {
    pub fn new(name: impl Into<String>, quantity: i64, unit: Option<&str>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.map(str::to_string),
        }
    }
}

/// Anything that carries a medication and the times-of-day it is due.
///
/// Stored plans implement this so the engine never has to know about
/// persistence types.
pub trait Dosed {
    fn medication(&self) -> &Medication;
    fn times(&self) -> &[String];
}

/// Minimal owned plan, handy for callers without a stored plan at hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTimes {
    pub medication: Medication,
    pub times: Vec<String>,
}

impl Dosed for PlanTimes {
    fn medication(&self) -> &Medication {
        &self.medication
    }

    fn times(&self) -> &[String] {
        &self.times
    }
}
