//! Anonymous caller identity carried in the `user_id` cookie.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::error::{AppError, Result};

/// Cookie holding the caller token.
pub const USER_ID_COOKIE: &str = "user_id";

/// Read the caller token from the request cookies.
///
/// A quoted value is unquoted. Percent-escapes are kept verbatim; minted
/// tokens are UUIDs and never contain them.
pub fn caller_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| name.trim() == USER_ID_COOKIE)
        .map(|(_, value)| unquote(value.trim()))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .trim()
}

/// Caller token, or `Unauthenticated` when absent.
pub fn require_caller(headers: &HeaderMap) -> Result<String> {
    caller_id(headers).ok_or(AppError::Unauthenticated)
}

/// `Set-Cookie` value persisting a freshly minted token.
pub fn set_cookie(token: &str) -> Result<(axum::http::HeaderName, HeaderValue)> {
    let cookie = format!("{USER_ID_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/");
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid cookie value: {e}")))?;
    Ok((SET_COOKIE, value))
}
