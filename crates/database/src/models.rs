//! Database models.

use std::fmt;
use std::str::FromStr;

use schedule::{Dosed, Medication};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::ValidationError;

/// An elderly person whose medication is being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Elderly {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// A profile with its family code and full medication plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElderlyProfile {
    pub id: i64,
    pub name: String,
    /// Lookup code shared with family members, if one was issued.
    pub family_code: Option<String>,
    /// Plans in creation order.
    pub plans: Vec<MedicationPlan>,
}

/// One medication with its dose and the times-of-day it is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPlan {
    pub id: i64,
    pub elderly_id: i64,
    pub medication: Medication,
    /// Zero-padded `HH:MM` values in insertion order.
    pub times: Vec<String>,
    pub note: Option<String>,
}

impl Dosed for MedicationPlan {
    fn medication(&self) -> &Medication {
        &self.medication
    }

    fn times(&self) -> &[String] {
        &self.times
    }
}

/// Stored `medication_plan` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PlanRow {
    pub id: i64,
    pub elderly_id: i64,
    pub med_name: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub note: Option<String>,
}

/// Stored `medication_time` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TimeRow {
    pub plan_id: i64,
    pub time_hhmm: String,
}

/// Medication as submitted by a caller; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A plan as submitted by a caller.
///
/// Entries without a medication name or with a non-positive quantity are
/// dropped on save rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub medication: Option<MedicationInput>,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl PlanInput {
    pub fn new(name: &str, quantity: i64, unit: Option<&str>, times: &[&str]) -> Self {
        Self {
            medication: Some(MedicationInput {
                name: Some(name.to_string()),
                quantity: Some(quantity),
                unit: unit.map(str::to_string),
            }),
            times: times.iter().map(|t| t.to_string()).collect(),
            note: None,
        }
    }
}

/// Input for creating or updating a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveProfile {
    /// Existing profile to update; `None` (or a non-positive id) creates one.
    pub id: Option<i64>,
    pub name: String,
    pub plans: Vec<PlanInput>,
    /// Family code to bind instead of keeping or minting one.
    pub family_code: Option<String>,
}

/// Outcome claimed by an adherence check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RecordStatus {
    Done,
    Undone,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Done => "done",
            RecordStatus::Undone => "undone",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(RecordStatus::Done),
            "undone" => Ok(RecordStatus::Undone),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// An adherence check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MedicationRecord {
    /// Auto-incrementing ID.
    pub id: i64,
    pub elderly_id: i64,
    /// Calendar date the claim is about (`YYYY-MM-DD`).
    pub record_date: String,
    pub status: RecordStatus,
    /// Server timestamp (UTC).
    pub created_at: String,
    /// Local wall-clock `HH:MM` at creation.
    pub record_time: Option<String>,
    /// `created_at` on the local clock as `MM/DD HH:MM`, for display.
    pub created_time: Option<String>,
}

/// Default elderly profile bound to an anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    /// Opaque caller token.
    pub user_id: String,
    pub default_elderly_id: Option<i64>,
    /// Last update timestamp.
    pub updated_at: String,
}
