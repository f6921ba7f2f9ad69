//! Caller identity and default elderly binding.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{user_settings, UserSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::required_id;
use crate::caller::{caller_id, require_caller, set_cookie};
use crate::error::Result;
use crate::state::AppState;

/// Caller identity.
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: String,
}

/// Caller's default binding.
#[derive(Serialize)]
pub struct SettingsResponse {
    pub user_id: String,
    pub default_elderly_id: Option<i64>,
}

/// Request to bind a default elderly profile.
#[derive(Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub default_elderly_id: Option<Value>,
}

/// Return the caller token, minting and setting the cookie on first visit.
pub async fn me(headers: HeaderMap) -> Result<Response> {
    let existing = caller_id(&headers);
    let token = user_settings::ensure_caller_id(existing.as_deref());

    let mut response = Json(MeResponse {
        user_id: token.value.clone(),
    })
    .into_response();

    if token.minted {
        let (name, value) = set_cookie(&token.value)?;
        response.headers_mut().insert(name, value);
        tracing::info!("Issued new caller token");
    }

    Ok(response)
}

/// Get the caller's default elderly profile.
pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SettingsResponse>> {
    let user_id = require_caller(&headers)?;
    let default_elderly_id = user_settings::get_default(state.db.pool(), &user_id).await?;

    Ok(Json(SettingsResponse {
        user_id,
        default_elderly_id,
    }))
}

/// Bind the caller to a default elderly profile.
pub async fn save_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SettingsRequest>, JsonRejection>,
) -> Result<Json<UserSettings>> {
    let user_id = require_caller(&headers)?;
    let Json(req) = payload?;
    let elderly_id = required_id("default_elderly_id", req.default_elderly_id.as_ref())?;

    let settings = user_settings::set_default(state.db.pool(), &user_id, elderly_id).await?;
    Ok(Json(settings))
}
