use crate::error::{api_success, ApiResponse};
use crate::server::StaynestServer;
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    /// Application name
    #[schema(example = "Staynest Engine")]
    pub name: String,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(api_success(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Version information
#[utoipa::path(
    get,
    path = "/version",
    tag = "health",
    responses(
        (status = 200, description = "Build information", body = VersionResponse)
    )
)]
pub async fn version_info(
    State(server): State<StaynestServer>,
) -> Json<ApiResponse<VersionResponse>> {
    Json(api_success(VersionResponse {
        name: server.config.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
