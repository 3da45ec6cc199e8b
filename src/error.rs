use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Reasons a request fails authentication. Every variant is a 401 except
/// `Internal`, and each carries its own message so clients can tell an
/// expired session from a forged one.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication token not provided")]
    MissingToken,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("token expired, please log in again")]
    ExpiredToken,
    #[error("invalid token")]
    InvalidSignature,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("authentication failed: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("access denied")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(AuthError::Internal(_)) => "INTERNAL_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Booking conflicts share the 400 family with other rejected input.
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(AuthError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to a client. Internal details are logged here
    /// and replaced with a generic text.
    fn user_message(&self) -> String {
        match self {
            Self::Database(e) => {
                error!(error = ?e, "database error");
                "internal server error".into()
            }
            Self::Internal(msg) => {
                error!(error = %msg, "internal error");
                "internal server error".into()
            }
            Self::Unauthorized(AuthError::Internal(msg)) => {
                error!(error = %msg, "authentication internal error");
                "internal authentication error".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.user_message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Name of the constraint a write tripped over, when the database reports
/// a uniqueness violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    constraint_for(err, UNIQUE_VIOLATION)
}

pub fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    constraint_for(err, FOREIGN_KEY_VIOLATION)
}

fn constraint_for(err: &sqlx::Error, sqlstate: &str) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(sqlstate) => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::conflict("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(AuthError::ExpiredToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn expired_and_invalid_tokens_have_distinct_messages() {
        let expired = AppError::from(AuthError::ExpiredToken).to_string();
        let invalid = AppError::from(AuthError::InvalidSignature).to_string();
        assert_ne!(expired, invalid);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::internal("connection refused on 10.0.0.3");
        assert_eq!(err.user_message(), "internal server error");
    }

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        assert!(unique_violation(&sqlx::Error::RowNotFound).is_none());
        assert!(foreign_key_violation(&sqlx::Error::PoolTimedOut).is_none());
    }
}
