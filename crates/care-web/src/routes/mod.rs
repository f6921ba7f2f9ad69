//! Route handlers for the care web service.

pub mod elderly;
pub mod family;
pub mod health;
pub mod medication;
pub mod user;

use axum::routing::get;
use axum::Router;
use database::validation::{parse_id, validate_id};
use database::ValidationError;
use serde_json::Value;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Plans
        .route(
            "/api/elderly",
            get(elderly::get_profile).post(elderly::save_profile),
        )
        .route("/api/elderly/schedule", get(elderly::get_schedule))
        // Family codes
        .route(
            "/api/family-code",
            get(family::get_code).post(family::rotate_code),
        )
        .route("/api/family/:code", get(family::family_view))
        // Adherence
        .route(
            "/api/medication",
            get(medication::list_records)
                .post(medication::create_record)
                .patch(medication::update_record),
        )
        // Caller binding
        .route("/api/user/me", get(user::me))
        .route(
            "/api/user/settings",
            get(user::get_settings).post(user::save_settings),
        )
}

/// Identifier from a query string parameter.
pub(crate) fn query_id(field: &str, raw: Option<&str>) -> Result<i64, ValidationError> {
    match raw {
        Some(raw) => parse_id(field, raw),
        None => Err(ValidationError::Empty(field.to_string())),
    }
}

/// Identifier from a JSON body, given as a number or a numeric string.
pub(crate) fn required_id(field: &str, value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Empty(field.to_string())),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ValidationError::InvalidId(field.to_string()))
            .and_then(|id| validate_id(field, id)),
        Some(Value::String(s)) => parse_id(field, s),
        Some(_) => Err(ValidationError::InvalidId(field.to_string())),
    }
}

/// Identifier that may be absent or junk; `None` means "create".
pub(crate) fn loose_id(value: Option<&Value>) -> Option<i64> {
    required_id("id", value).ok()
}
