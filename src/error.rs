//! Error taxonomy shared by the OTP and credential engines.
//!
//! Every variant carries a stable machine code and maps to one HTTP status.
//! Internal faults are logged with full detail server-side and surfaced to
//! callers as an opaque 500 with no internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please wait {retry_after_seconds} seconds before requesting a new code")]
    RateLimited { retry_after_seconds: u64 },

    #[error("OTP not found or does not match the phone number")]
    NotFound,

    #[error("This OTP has already been used or invalidated")]
    Gone,

    #[error("OTP has expired")]
    Expired,

    #[error("Too many verification attempts, please request a new OTP")]
    TooManyAttempts,

    #[error("Incorrect OTP")]
    InvalidCode,

    #[error("Invalid or expired token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("An account with this email or phone already exists")]
    Conflict,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Wire shape for every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } | Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Gone => StatusCode::GONE,
            Self::Expired
            | Self::InvalidCode
            | Self::Unauthorized
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::NotFound => "not_found",
            Self::Gone => "gone",
            Self::Expired => "expired",
            Self::TooManyAttempts => "too_many_attempts",
            Self::InvalidCode => "invalid_code",
            Self::Unauthorized => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            // Full detail stays server-side; the caller gets an opaque body.
            error!("Internal fault: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    code: "internal",
                    message: "An unexpected error occurred".to_string(),
                }),
            )
                .into_response();
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
