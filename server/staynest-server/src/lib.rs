//! Staynest Server - identity and session-authorization API
//!
//! This library provides the HTTP surface over `identity-engine`:
//! registration, credential and federated login, session verification
//! middleware, and role-gated routes.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod validation;

// Re-export commonly used types
pub use error::*;
pub use server::{identity_config_from_env, ServerConfig, StaynestServer};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: StaynestServer) -> Router {
    routes::create_routes(server.clone())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(server)
}
