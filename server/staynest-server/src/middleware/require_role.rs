//! Role-based authorization guard.
//!
//! A pure predicate over the request's [`Principal`] and a statically
//! supplied allow-list; no I/O and no side effects. Layered after (inside)
//! the authentication middleware.

use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use identity_engine::{IdentityError, Principal, Role};
use std::future::Future;
use std::pin::Pin;

type GuardFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Build a guard that admits only the listed roles.
///
/// A request with no attached principal is rejected with
/// `Unauthenticated`. It cannot happen when the authentication middleware
/// is layered outside this guard, but is defended against anyway.
///
/// Usage: `.layer(axum::middleware::from_fn(require_role(&[Role::Admin])))`
pub fn require_role(allowed: &'static [Role]) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let principal = request
                .extensions()
                .get::<Principal>()
                .ok_or(IdentityError::Unauthenticated)?;

            if !allowed.contains(&principal.role) {
                tracing::warn!(
                    account_id = %principal.account_id,
                    role = %principal.role,
                    "role not in route allow-list"
                );
                return Err(IdentityError::Forbidden.into());
            }

            Ok(next.run(request).await)
        })
    }
}
