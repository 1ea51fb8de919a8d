use crate::{
    handlers::{admin, auth, health},
    middleware::{authenticate, require_role},
    openapi,
    server::StaynestServer,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use identity_engine::Role;

pub mod paths {
    pub const API_V1: &str = "/api/v1";

    pub mod health {
        pub const HEALTH: &str = "/health";
        pub const VERSION: &str = "/version";
    }

    pub mod auth {
        pub const REGISTER: &str = "/auth/register";
        pub const LOGIN: &str = "/auth/login";
        /// Federated callback; `:provider` is `google` or `facebook`.
        pub const FEDERATED_CALLBACK: &str = "/auth/:provider/callback";
        pub const ME: &str = "/auth/me";
        pub const REFRESH: &str = "/auth/refresh";
        /// Acknowledgment only: tokens are not persisted, so logout cannot
        /// revoke them server-side.
        pub const LOGOUT: &str = "/auth/logout";
    }

    pub mod admin {
        pub const ACCOUNT_BY_ID: &str = "/admin/accounts/:id";
    }
}

/// Create health check routes (no authentication required)
pub fn health_routes() -> Router<StaynestServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Create unauthenticated authentication routes: registration, credential
/// login, and the federated-login callback.
pub fn auth_routes() -> Router<StaynestServer> {
    Router::new()
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::FEDERATED_CALLBACK, get(auth::federated_callback))
}

/// Create session routes gated by the authentication middleware.
pub fn session_routes(server: StaynestServer) -> Router<StaynestServer> {
    Router::new()
        .route(paths::auth::ME, get(auth::me))
        .route(paths::auth::REFRESH, post(auth::refresh))
        .route(paths::auth::LOGOUT, post(auth::logout))
        .layer(from_fn_with_state(server, authenticate))
}

/// Create admin routes: authentication middleware plus the admin role
/// guard. Layer order matters: the guard reads the principal the
/// authentication layer attaches, so authentication is the outer layer.
pub fn admin_routes(server: StaynestServer) -> Router<StaynestServer> {
    Router::new()
        .route(paths::admin::ACCOUNT_BY_ID, get(admin::get_account))
        .layer(from_fn(require_role(&[Role::Admin])))
        .layer(from_fn_with_state(server, authenticate))
}

/// Create API v1 routes
pub fn api_v1_routes(server: StaynestServer) -> Router<StaynestServer> {
    Router::new()
        .merge(auth_routes())
        .merge(session_routes(server.clone()))
        .merge(admin_routes(server))
}

/// Create all application routes
pub fn create_routes(server: StaynestServer) -> Router<StaynestServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        // API documentation routes
        .merge(openapi::create_docs_routes())
        // API v1 routes
        .nest(paths::API_V1, api_v1_routes(server))
}
