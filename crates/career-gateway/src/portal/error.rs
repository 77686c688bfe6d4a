use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::accounts::identity::IdentityError;
use super::repository::RepositoryError;

/// Client-side style field checks, surfaced verbatim to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("application status cannot be set to {0}")]
    UnsupportedStatus(&'static str),
    #[error("application {0} is not an admission")]
    NotAdmitted(String),
    #[error("there are no competing admissions to resolve")]
    NoCompetingAdmissions,
    #[error("institution {0} is not accepting applications")]
    InstitutionInactive(String),
    #[error("course {0} is not accepting applications")]
    CourseClosed(String),
    #[error("job {0} is not accepting applications")]
    JobClosed(String),
}

/// Error raised by the portal services.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("maximum {limit} applications per institution")]
    CapacityExceeded { limit: usize },
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PortalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::CapacityExceeded { .. } | PortalError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            PortalError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Identity(err) => match err {
                IdentityError::InvalidCredentials | IdentityError::InvalidSession => {
                    StatusCode::UNAUTHORIZED
                }
                IdentityError::EmailTaken => StatusCode::CONFLICT,
                IdentityError::UnknownVerificationCode => StatusCode::NOT_FOUND,
                IdentityError::Unavailable(_) => StatusCode::BAD_GATEWAY,
            },
            PortalError::Repository(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict | RepositoryError::PreconditionFailed(_) => {
                    StatusCode::CONFLICT
                }
                RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
