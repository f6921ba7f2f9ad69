//! Family code routes and the read-only family view.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use database::{family_code, medication_record, ElderlyProfile, MedicationRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{query_id, required_id};
use crate::error::Result;
use crate::state::AppState;

/// `?elderly_id=` query.
#[derive(Deserialize)]
pub struct CodeQuery {
    pub elderly_id: Option<String>,
}

/// Request to rotate a family code.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateRequest {
    #[serde(default, alias = "elderly_id")]
    pub elderly_id: Option<Value>,
    /// Code to bind; a new one is generated when absent.
    #[serde(default)]
    pub code: Option<String>,
}

/// Current code of a profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeResponse {
    pub elderly_id: i64,
    pub code: Option<String>,
}

/// What a family member sees through a code.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyView {
    pub profile: ElderlyProfile,
    /// Newest first.
    pub records: Vec<MedicationRecord>,
    /// Local calendar date `taken_today` refers to.
    pub today: String,
    pub taken_today: bool,
}

/// Get the current family code.
pub async fn get_code(
    State(state): State<AppState>,
    query: std::result::Result<Query<CodeQuery>, QueryRejection>,
) -> Result<Json<CodeResponse>> {
    let Query(query) = query?;
    let elderly_id = query_id("elderly_id", query.elderly_id.as_deref())?;

    let code = family_code::get_code(state.db.pool(), elderly_id).await?;
    Ok(Json(CodeResponse { elderly_id, code }))
}

/// Replace the family code.
pub async fn rotate_code(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RotateRequest>, JsonRejection>,
) -> Result<Json<CodeResponse>> {
    let Json(req) = payload?;
    let elderly_id = required_id("elderlyId", req.elderly_id.as_ref())?;
    let explicit = req.code.as_deref().filter(|c| !c.trim().is_empty());

    let code = family_code::rotate(&state.db, elderly_id, explicit).await?;
    Ok(Json(CodeResponse {
        elderly_id,
        code: Some(code),
    }))
}

/// Profile, records and today's status behind a family code.
pub async fn family_view(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<FamilyView>> {
    let pool = state.db.pool();
    let profile = family_code::find_by_code(pool, &code).await?;
    let records = medication_record::list_for(pool, profile.id).await?;

    let today = schedule::local_today().format("%Y-%m-%d").to_string();
    let taken_today = medication_record::taken_on(&records, &today);

    Ok(Json(FamilyView {
        profile,
        records,
        today,
        taken_today,
    }))
}
