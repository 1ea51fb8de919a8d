//! OpenAPI documentation assembly.

use crate::handlers::{admin, auth, health};
use crate::server::StaynestServer;
use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staynest Engine API",
        description = "Identity and session-authorization API for the Staynest platform"
    ),
    paths(
        health::health_check,
        health::version_info,
        auth::register,
        auth::login,
        auth::federated_callback,
        auth::me,
        auth::refresh,
        auth::logout,
        admin::get_account,
    ),
    components(schemas(
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::AccountResponse,
        auth::SessionResponse,
        auth::TokenResponse,
        health::HealthResponse,
        health::VersionResponse,
    )),
    modifiers(&BearerTokenScheme),
    tags(
        (name = "authentication", description = "Registration, login and session lifecycle"),
        (name = "admin", description = "Role-gated administrative endpoints"),
        (name = "health", description = "Service health and version")
    )
)]
pub struct ApiDoc;

struct BearerTokenScheme;

impl Modify for BearerTokenScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Swagger UI plus the raw OpenAPI document.
pub fn create_docs_routes() -> Router<StaynestServer> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
