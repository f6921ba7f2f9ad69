//! Adherence record routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{medication_record, MedicationRecord, RecordStatus, ValidationError};
use serde::Deserialize;
use serde_json::Value;

use super::{query_id, required_id};
use crate::error::Result;
use crate::state::AppState;

/// `?elderly_id=` query.
#[derive(Deserialize)]
pub struct RecordsQuery {
    pub elderly_id: Option<String>,
}

/// Request to append a check-in.
#[derive(Deserialize)]
pub struct RecordRequest {
    #[serde(default)]
    pub elderly_id: Option<Value>,
    #[serde(default)]
    pub record_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request to change a check-in's status.
#[derive(Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_status(raw: Option<&str>) -> std::result::Result<RecordStatus, ValidationError> {
    match raw {
        Some(raw) => raw.parse(),
        None => Err(ValidationError::Empty("status".to_string())),
    }
}

/// List check-ins, newest first.
pub async fn list_records(
    State(state): State<AppState>,
    query: std::result::Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<Json<Vec<MedicationRecord>>> {
    let Query(query) = query?;
    let elderly_id = query_id("elderly_id", query.elderly_id.as_deref())?;

    let records = medication_record::list_for(state.db.pool(), elderly_id).await?;
    Ok(Json(records))
}

/// Append a check-in.
pub async fn create_record(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MedicationRecord>)> {
    let Json(req) = payload?;
    let elderly_id = required_id("elderly_id", req.elderly_id.as_ref())?;
    let record_date = req
        .record_date
        .ok_or_else(|| ValidationError::Empty("record_date".to_string()))?;
    let status = parse_status(req.status.as_deref())?;

    let record = medication_record::record(state.db.pool(), elderly_id, &record_date, status).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Change a check-in's status.
pub async fn update_record(
    State(state): State<AppState>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MedicationRecord>> {
    let Json(req) = payload?;
    let id = required_id("id", req.id.as_ref())?;
    let status = parse_status(req.status.as_deref())?;

    let record = medication_record::set_status(state.db.pool(), id, status).await?;
    Ok(Json(record))
}
