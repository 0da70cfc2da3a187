//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::booking::BookingError;
use crate::db::DatabaseError;
use crate::feedback::FeedbackError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden(detail) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone())
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Conflict { code, message } => {
                (StatusCode::CONFLICT, *code, message.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        use BookingError::*;
        match err {
            InvalidDoctor | InvalidTimeFormat | OutsideBusinessHours | InvalidConcern
            | InvalidPrescription { .. } => ApiError::BadRequest(err.to_string()),
            DailyLimitExceeded => ApiError::Conflict {
                code: "DAILY_LIMIT",
                message: err.to_string(),
            },
            NotFound => ApiError::NotFound(err.to_string()),
            NotPending => ApiError::Conflict {
                code: "NOT_PENDING",
                message: err.to_string(),
            },
            AlreadyAccepted => ApiError::Conflict {
                code: "ALREADY_ACCEPTED",
                message: err.to_string(),
            },
            InvalidTransition => ApiError::Conflict {
                code: "INVALID_TRANSITION",
                message: err.to_string(),
            },
            PrescriptionNotAllowed => ApiError::Conflict {
                code: "NOT_COMPLETED",
                message: err.to_string(),
            },
            Forbidden => ApiError::Forbidden(err.to_string()),
            Database(db) => db.into(),
        }
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        use FeedbackError::*;
        match err {
            AppointmentNotFound => ApiError::NotFound(err.to_string()),
            NotCompleted => ApiError::Conflict {
                code: "NOT_COMPLETED",
                message: err.to_string(),
            },
            Duplicate => ApiError::Conflict {
                code: "FEEDBACK_EXISTS",
                message: err.to_string(),
            },
            Forbidden => ApiError::Forbidden(err.to_string()),
            InvalidRating | CommentTooLong => ApiError::BadRequest(err.to_string()),
            Database(db) => db.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        use AuthError::*;
        match err {
            InvalidName | InvalidEmail | WeakPassword => ApiError::BadRequest(err.to_string()),
            EmailTaken => ApiError::Conflict {
                code: "EMAIL_TAKEN",
                message: err.to_string(),
            },
            InvalidCredentials => ApiError::Unauthorized,
            Hashing => ApiError::Internal(err.to_string()),
            Database(db) => db.into(),
        }
    }
}
