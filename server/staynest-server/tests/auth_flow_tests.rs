//! End-to-end authentication flows over the assembled router.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use identity_engine::{
    AccountDraft, AccountRepository, IdentityConfig, InMemoryAccountRepository, Provider, Role,
    SessionTokenService,
};
use serde_json::{json, Value};
use staynest_server::{create_app, ServerConfig, StaynestServer};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret";

fn test_server() -> (Router, Arc<InMemoryAccountRepository>) {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let identity_config = IdentityConfig {
        token_secret: TEST_SECRET.to_string(),
        argon2_memory_kib: 4096,
        argon2_iterations: 1,
        ..IdentityConfig::default()
    };
    let server =
        StaynestServer::with_repository(ServerConfig::default(), identity_config, repo.clone())
            .unwrap();
    (create_app(server), repo)
}

fn token_service(ttl: Duration) -> SessionTokenService {
    SessionTokenService::new(TEST_SECRET, ttl)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_ann(app: &Router) -> (Uuid, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Ann", "email": "ann@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let data = &body["data"];
    let id = Uuid::parse_str(data["account"]["id"].as_str().unwrap()).unwrap();
    let token = data["token"].as_str().unwrap().to_string();
    (id, token)
}

#[tokio::test]
async fn register_returns_created_session() {
    let (app, _) = test_server();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Ann", "email": "ann@x.com", "password": "secret1"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));

    let account = &body["data"]["account"];
    assert_eq!(account["email"], json!("ann@x.com"));
    assert_eq!(account["role"], json!("seeker"));
    assert!(account.get("password_hash").is_none());
    assert!(account.get("provider_links").is_none());
    assert!(!body["data"]["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_token_subject_is_the_registered_account() {
    let (app, _) = test_server();
    let (id, _) = register_ann(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "ann@x.com", "password": "secret1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap();
    let subject = token_service(Duration::hours(1)).verify(token).unwrap();
    assert_eq!(subject, id);
}

#[tokio::test]
async fn login_with_wrong_password_is_400() {
    let (app, _) = test_server();
    register_ann(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "ann@x.com", "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("invalid_credentials"));
}

#[tokio::test]
async fn login_with_unknown_email_is_indistinguishable() {
    let (app, _) = test_server();
    register_ann(&app).await;

    let (wrong_pw_status, wrong_pw) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "ann@x.com", "password": "wrong"})),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "nobody@x.com", "password": "secret1"})),
    )
    .await;

    assert_eq!(wrong_pw_status, unknown_status);
    assert_eq!(wrong_pw["error"], unknown["error"]);
}

#[tokio::test]
async fn register_duplicate_email_is_409() {
    let (app, _) = test_server();
    register_ann(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Ann Again", "email": "ann@x.com", "password": "secret2"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("conflict"));
}

#[tokio::test]
async fn register_with_admin_role_is_rejected() {
    let (app, _) = test_server();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Eve", "email": "eve@x.com", "password": "secret1", "role": "admin"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_requires_a_token() {
    let (app, _) = test_server();

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("missing_token"));

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("token_malformed"));
}

#[tokio::test]
async fn me_returns_the_authenticated_account() {
    let (app, _) = test_server();
    let (id, token) = register_ann(&app).await;

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id.to_string()));
    assert_eq!(body["data"]["email"], json!("ann@x.com"));
}

#[tokio::test]
async fn expired_token_is_401() {
    let (app, _) = test_server();
    let (id, _) = register_ann(&app).await;

    // Same secret, expiry already in the past.
    let expired = token_service(Duration::seconds(-5)).issue(id).unwrap();

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&expired.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("token_expired"));
}

#[tokio::test]
async fn inactive_account_vetoes_a_valid_token() {
    let (app, repo) = test_server();
    let (id, token) = register_ann(&app).await;

    repo.set_active(id, false).await.unwrap();

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("account_inactive"));
}

#[tokio::test]
async fn refresh_mints_a_new_valid_token() {
    let (app, _) = test_server();
    let (id, token) = register_ann(&app).await;

    let (status, body) = send(&app, "POST", "/api/v1/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let fresh = body["data"]["token"].as_str().unwrap();
    assert_eq!(token_service(Duration::hours(1)).verify(fresh).unwrap(), id);
}

#[tokio::test]
async fn logout_acknowledges_without_revoking() {
    let (app, _) = test_server();
    let (_, token) = register_ann(&app).await;

    let (status, _) = send(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Tokens are not persisted server-side; the session outlives logout.
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn seeker_is_forbidden_from_admin_routes() {
    let (app, _) = test_server();
    let (id, token) = register_ann(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/accounts/{id}"),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("forbidden"));
}

#[tokio::test]
async fn admin_passes_the_role_guard() {
    let (app, repo) = test_server();
    let (ann_id, _) = register_ann(&app).await;

    let admin = repo
        .create(AccountDraft {
            name: "Root".to_string(),
            email: "root@x.com".to_string(),
            password_hash: None,
            auth_provider: Provider::Local,
            provider_links: Vec::new(),
            role: Role::Admin,
            is_verified: true,
            referral_code: "ROOT0001".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap();
    let admin_token = token_service(Duration::hours(1)).issue(admin.id).unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/accounts/{ann_id}"),
        Some(&admin_token.token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("ann@x.com"));
}

#[tokio::test]
async fn admin_routes_require_authentication_first() {
    let (app, _) = test_server();
    let id = Uuid::new_v4();

    let (status, body) = send(&app, "GET", &format!("/api/v1/admin/accounts/{id}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("missing_token"));
}

#[tokio::test]
async fn federated_callback_redirects_with_a_token() {
    let (app, _) = test_server();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/google/callback?subject_id=g-1&email=ann@x.com&name=Ann")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("http://localhost:3000/auth/callback?token="));

    let token = location.split("token=").nth(1).unwrap();
    let subject = token_service(Duration::hours(1)).verify(token).unwrap();

    // Repeat callback resolves to the same account.
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/google/callback?subject_id=g-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    let token = location.split("token=").nth(1).unwrap();
    assert_eq!(token_service(Duration::hours(1)).verify(token).unwrap(), subject);
}

#[tokio::test]
async fn federated_callback_links_to_local_account_with_same_email() {
    let (app, repo) = test_server();
    let (id, _) = register_ann(&app).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/google/callback?subject_id=g-1&email=ann@x.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Linked, not duplicated.
    assert_eq!(repo.len().await, 1);
    let account = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(account.link_for(Provider::Google).is_some());
}

#[tokio::test]
async fn federated_callback_without_email_for_new_subject_is_400() {
    let (app, _) = test_server();

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/auth/google/callback?subject_id=brand-new",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("missing_email"));
}

#[tokio::test]
async fn unknown_provider_callback_is_404() {
    let (app, _) = test_server();

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/auth/github/callback?subject_id=x",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // "local" is routable but not a federated provider.
    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/auth/local/callback?subject_id=x",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let (app, _) = test_server();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("healthy"));
}
