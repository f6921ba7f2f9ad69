//! Elderly profile routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use database::{elderly, ElderlyProfile, MedicationInput, PlanInput, SaveProfile};
use schedule::ScheduleWindow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{loose_id, query_id};
use crate::error::Result;
use crate::state::AppState;

/// `?id=` query.
#[derive(Deserialize)]
pub struct ProfileQuery {
    pub id: Option<String>,
}

/// Request to create or update a profile.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Number or numeric string; anything else creates a new profile.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    /// Taken as-is; malformed entries are dropped, not rejected.
    #[serde(default)]
    pub plans: Option<Value>,
    #[serde(default)]
    pub family_code: Option<Value>,
}

/// Schedule for a profile at the current local time.
#[derive(Serialize)]
pub struct ScheduleResponse {
    /// Local `HH:MM` the active window was computed for.
    pub now: String,
    pub schedule: Vec<ScheduleWindow>,
    /// Window a reminder is due for, if any.
    pub active: Option<ScheduleWindow>,
}

/// Get a profile with its plans and family code.
pub async fn get_profile(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<ElderlyProfile>> {
    let Query(query) = query?;
    let id = query_id("id", query.id.as_deref())?;

    let profile = elderly::get_profile(state.db.pool(), id).await?;
    Ok(Json(profile))
}

/// Create or update a profile, replacing its plans.
pub async fn save_profile(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<ElderlyProfile>> {
    let Json(req) = payload?;

    let input = SaveProfile {
        id: loose_id(req.id.as_ref()),
        name: text(req.name.as_ref()).unwrap_or_default(),
        plans: plans_from_json(req.plans.as_ref()),
        family_code: text(req.family_code.as_ref()),
    };

    let profile = elderly::save_profile(&state.db, &input).await?;
    Ok(Json(profile))
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Read submitted plans, keeping entries with a medication name and a
/// positive whole quantity. A non-array yields no plans.
fn plans_from_json(value: Option<&Value>) -> Vec<PlanInput> {
    match value {
        Some(Value::Array(entries)) => entries.iter().filter_map(plan_from_json).collect(),
        _ => Vec::new(),
    }
}

fn plan_from_json(entry: &Value) -> Option<PlanInput> {
    let medication = entry.get("medication")?;
    let name = medication.get("name")?.as_str()?;
    let quantity = positive_quantity(medication.get("quantity")?)?;

    // Null or non-string times are skipped
    let times = match entry.get("times") {
        Some(Value::Array(times)) => times
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Some(PlanInput {
        medication: Some(MedicationInput {
            name: Some(name.to_string()),
            quantity: Some(quantity),
            unit: text(medication.get("unit")),
        }),
        times,
        note: text(entry.get("note")),
    })
}

/// Quantity given as a whole number or a numeric string.
fn positive_quantity(value: &Value) -> Option<i64> {
    let quantity = match value {
        Value::Number(n) => match n.as_i64() {
            Some(q) => q,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 1.0 || f > i64::MAX as f64 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (quantity > 0).then_some(quantity)
}

/// Derive the schedule and the window due now.
pub async fn get_schedule(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<ScheduleResponse>> {
    let Query(query) = query?;
    let id = query_id("id", query.id.as_deref())?;

    let profile = elderly::get_profile(state.db.pool(), id).await?;
    let now = schedule::local_now();
    let windows = schedule::derive_schedule(&profile.plans);
    let active = schedule::active_window(&windows, now).cloned();

    Ok(Json(ScheduleResponse {
        now: now.format("%H:%M").to_string(),
        schedule: windows,
        active,
    }))
}
