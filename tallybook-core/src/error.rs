use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for an exclusion constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";

/// Error type returned by every API operation.
///
/// Each variant maps to one HTTP status; the body is a small JSON object
/// with a machine-readable `error` tag and a human-readable `message`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NO_CONTENT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Conflict(_) => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Database(_) => "database",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict(format!(
                        "duplicate value violates {}",
                        db_err.constraint().unwrap_or("a unique constraint")
                    ));
                }
                Some(EXCLUSION_VIOLATION) => {
                    return AppError::Conflict(format!(
                        "overlapping range violates {}",
                        db_err.constraint().unwrap_or("an exclusion constraint")
                    ));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        if let AppError::Database(ref e) = self {
            error!("Request failed with database error: {}", e);
        }

        let body = match &self {
            AppError::Unauthorized => json!({ "error": self.tag() }),
            AppError::Validation(msg) | AppError::Conflict(msg) => {
                json!({ "error": self.tag(), "message": msg })
            }
            other => json!({ "error": other.tag(), "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NO_CONTENT);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_has_empty_body() {
        let response = AppError::NotFound("invoice".into()).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_non_constraint_errors_stay_database_errors() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
