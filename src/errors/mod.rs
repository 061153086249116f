//! Error handling module for the volunteer backend.
//!
//! Engine errors are typed and returned to the caller; the HTTP layer maps
//! them to status codes and the response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::{ApplicationStatus, Role};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const PERSISTENCE_ERROR: &str = "PERSISTENCE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// A single failed field check. Registration reports the first one only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateUsername,
    InvalidName,
    InvalidEmail,
    InvalidPhone,
    InvalidAge,
    PasswordMismatch,
    WeakPassword,
    Underage,
    InvalidRole,
    TitleTooShort,
    LocationTooShort,
    DateTooShort,
    DescriptionTooShort,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::DuplicateUsername => "Username already exists.",
            ValidationError::InvalidName => "Name must contain only letters and spaces.",
            ValidationError::InvalidEmail => "Email must include '@' and end with an allowed domain suffix.",
            ValidationError::InvalidPhone => "Phone must be digits only, optionally starting with +.",
            ValidationError::InvalidAge => "Enter a valid numeric age within the allowed range.",
            ValidationError::PasswordMismatch => "Passwords do not match.",
            ValidationError::WeakPassword => "Password does not meet the strength requirements.",
            ValidationError::Underage => "Volunteers must meet the minimum volunteer age.",
            ValidationError::InvalidRole => "Invalid role selected.",
            ValidationError::TitleTooShort => "Title is too short.",
            ValidationError::LocationTooShort => "Location is too short.",
            ValidationError::DateTooShort => "Enter a valid date.",
            ValidationError::DescriptionTooShort => "Description too short.",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Input rejected by a validation rule
    Validation(ValidationError),
    /// Unknown credentials, username or scoped index
    NotFound(String),
    /// Opportunity index outside the collection
    OutOfRange { index: usize, len: usize },
    /// Applicant already applied to the same opportunity
    DuplicateApplication { username: String, title: String },
    /// Identity exists but has the wrong role for the operation
    RoleMismatch { username: String, expected: Role },
    /// Status change not allowed by the application state machine
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    /// Load or save of the backing store failed
    Persistence(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => codes::VALIDATION_ERROR,
            EngineError::NotFound(_) | EngineError::OutOfRange { .. } => codes::NOT_FOUND,
            EngineError::DuplicateApplication { .. } => codes::CONFLICT,
            EngineError::RoleMismatch { .. } => codes::FORBIDDEN,
            EngineError::InvalidTransition { .. } => codes::INVALID_TRANSITION,
            EngineError::Persistence(_) => codes::PERSISTENCE_ERROR,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(err) => write!(f, "{}", err),
            EngineError::NotFound(msg) => write!(f, "{}", msg),
            EngineError::OutOfRange { index, len } => {
                write!(f, "Invalid opportunity selection: {} (have {})", index, len)
            }
            EngineError::DuplicateApplication { username, title } => {
                write!(f, "{} has already applied for '{}'", username, title)
            }
            EngineError::RoleMismatch { username, expected } => {
                write!(f, "{} is not a {}", username, expected)
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "Cannot change status from {} to {}", from, to)
            }
            EngineError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Persistence(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Persistence(format!("JSON error: {}", err))
    }
}

/// Application error type for the HTTP surface.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Error raised by the workflow engine
    Engine(EngineError),
    /// The blocking task running an engine operation failed
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Engine(err) => match err {
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::NotFound(_) | EngineError::OutOfRange { .. } => StatusCode::NOT_FOUND,
                EngineError::DuplicateApplication { .. } => StatusCode::CONFLICT,
                EngineError::RoleMismatch { .. } => StatusCode::FORBIDDEN,
                EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
                EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Engine(err) => err.code(),
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Engine(err) => err.to_string(),
            AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        if let EngineError::Persistence(msg) = &err {
            tracing::error!("Persistence error: {}", msg);
        }
        AppError::Engine(err)
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        let details = match error {
            AppError::Engine(EngineError::InvalidTransition { from, to }) => {
                Some(serde_json::json!({ "from": from.as_str(), "to": to.as_str() }))
            }
            AppError::Engine(EngineError::OutOfRange { index, len }) => {
                Some(serde_json::json!({ "index": index, "len": len }))
            }
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
