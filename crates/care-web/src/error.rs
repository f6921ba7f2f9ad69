//! Error types for the care web service.
//!
//! Every failure leaves as `{"error": <code>, "message": <text>}` with a
//! stable code. Store failures are logged and reported generically.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Caller token missing where one is required.
    #[error("user_id is missing")]
    Unauthenticated,

    /// Value already bound to another entity.
    #[error("{0}")]
    Conflict(String),

    /// Persistence call failed.
    #[error("Database error: {0}")]
    Store(DatabaseError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Conflict(_) => "conflict",
            AppError::Store(_) | AppError::Internal(_) => "store_failure",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn entity_label(entity: &str) -> &'static str {
    match entity {
        "Elderly" => "elderly",
        "FamilyCode" => "family code",
        "MedicationRecord" => "record",
        _ => "resource",
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Invalid(invalid) => AppError::InvalidInput(invalid.to_string()),
            DatabaseError::NotFound { entity, .. } => {
                AppError::NotFound(format!("{} not found", entity_label(entity)))
            }
            DatabaseError::AlreadyExists { entity, .. } => {
                AppError::Conflict(format!("{} already in use", entity_label(entity)))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<database::ValidationError> for AppError {
    fn from(err: database::ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Store(err) => {
                tracing::error!("Database error: {}", err);
                "operation failed, please retry".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "operation failed, please retry".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": self.code(),
            "message": message,
        });

        (self.status(), Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database::ValidationError;

    #[test]
    fn test_database_errors_map_to_categories() {
        let err: AppError = DatabaseError::NotFound {
            entity: "Elderly",
            id: "7".to_string(),
        }
        .into();
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "elderly not found");

        let err: AppError = DatabaseError::Invalid(ValidationError::Empty("name".into())).into();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = DatabaseError::AlreadyExists {
            entity: "FamilyCode",
            id: "YAO-1".to_string(),
        }
        .into();
        assert_eq!(err.code(), "conflict");
        assert!(!err.to_string().contains("YAO-1"));

        let err: AppError = DatabaseError::Sqlx(sqlx_error()).into();
        assert_eq!(err.code(), "store_failure");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn sqlx_error() -> sqlx::Error {
        sqlx::Error::PoolTimedOut
    }
}
