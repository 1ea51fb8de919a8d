//! API error and response envelope types.
//!
//! Every identity failure maps to a stable status code and a non-leaking
//! message: credential failures never reveal whether an email exists or
//! which authentication method an account uses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use identity_engine::IdentityError;
use serde::Serialize;
use thiserror::Error;

/// Error returned by handlers and middleware.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication_error", message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "authorization_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        use IdentityError::*;

        match err {
            InvalidCredentials => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid email or password",
            ),
            MissingEmail => Self::new(
                StatusCode::BAD_REQUEST,
                "missing_email",
                "Identity provider supplied no usable email",
            ),
            WeakPassword(reason) => Self::new(
                StatusCode::BAD_REQUEST,
                "weak_password",
                format!("Password too weak: {reason}"),
            ),
            MissingToken => Self::new(
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Missing bearer token",
            ),
            TokenExpired => Self::new(
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Session has expired",
            ),
            TokenMalformed => Self::new(
                StatusCode::UNAUTHORIZED,
                "token_malformed",
                "Session token is invalid",
            ),
            Unauthenticated => Self::new(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authentication required",
            ),
            AccountInactive => Self::new(
                StatusCode::FORBIDDEN,
                "account_inactive",
                "Account is inactive",
            ),
            Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Insufficient role for this resource",
            ),
            ProviderConflict => Self::new(
                StatusCode::CONFLICT,
                "provider_conflict",
                "This provider identity is linked to another account",
            ),
            Conflict(_) => Self::new(
                StatusCode::CONFLICT,
                "conflict",
                "Email is already registered",
            ),
            Hashing | Internal(_) => {
                tracing::error!(error = %err, "internal identity failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: self.code,
                message: self.message,
            }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Wrap payload data in a success envelope.
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    }
}
