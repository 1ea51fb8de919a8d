//! Authentication middleware.
//!
//! Fully resolves (allow or reject) before any downstream handler runs:
//! extracts the bearer token, verifies signature and expiry, performs the
//! single account-state lookup, and attaches a [`Principal`] to the request
//! extensions. There is no retry or silent renewal here; `POST
//! /auth/refresh` is the explicit re-mint operation.

use crate::error::ApiError;
use crate::server::StaynestServer;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use identity_engine::IdentityError;

pub async fn authenticate(
    State(server): State<StaynestServer>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let principal = server.identity.authenticate_token(&token).await?;

    tracing::debug!(account_id = %principal.account_id, role = %principal.role, "request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(IdentityError::MissingToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| IdentityError::MissingToken.into())
}
