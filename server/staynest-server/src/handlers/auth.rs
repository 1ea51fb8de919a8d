use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::StaynestServer;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_field, validate_length, validate_required};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use identity_engine::{
    Account, AccountRepository, FederatedIdentity, IdentityError, NewAccount, Principal, Provider,
    PublicAccount, Role, Session,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Ann",
    "email": "ann@x.com",
    "password": "secret1",
    "role": "seeker"
}))]
pub struct RegisterRequest {
    /// Display name
    #[schema(example = "Ann")]
    pub name: String,
    /// Email address; unique per local account
    #[schema(example = "ann@x.com")]
    pub email: String,
    /// Plaintext password, hashed before storage
    #[schema(example = "secret1")]
    pub password: String,
    /// Requested role: "seeker" (default) or "owner"
    #[schema(example = "seeker")]
    pub role: Option<String>,
}

impl RequestValidation for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Name is required");
        validate_length!(self.name, 1, 100, "Name must be between 1 and 100 characters");
        validate_required!(self.email, "Email is required");
        validate_email!(self.email, "Invalid email format");
        validate_length!(
            self.password,
            6,
            128,
            "Password must be between 6 and 128 characters"
        );
        Ok(())
    }
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "email": "ann@x.com",
    "password": "secret1"
}))]
pub struct LoginRequest {
    #[schema(example = "ann@x.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_required!(self.password, "Password is required");
        Ok(())
    }
}

/// Federated callback parameters, extracted from the provider response by
/// the external OAuth client.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Provider-assigned subject id
    pub subject_id: String,
    /// Email as asserted by the provider
    pub email: Option<String>,
    /// Display name from the provider profile
    pub name: Option<String>,
    /// Avatar URL from the provider profile
    pub avatar_url: Option<String>,
}

/// Public account view. Never carries the password hash or raw provider
/// links.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    #[schema(example = "Ann")]
    pub name: String,
    #[schema(example = "ann@x.com")]
    pub email: String,
    #[schema(example = "seeker")]
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    #[schema(example = "Q3QH7A2M")]
    pub referral_code: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<PublicAccount> for AccountResponse {
    fn from(view: PublicAccount) -> Self {
        Self {
            id: view.id,
            name: view.name,
            email: view.email,
            role: view.role.to_string(),
            is_active: view.is_active,
            is_verified: view.is_verified,
            referral_code: view.referral_code,
            avatar_url: view.avatar_url,
            created_at: view.created_at,
            last_login_at: view.last_login_at,
        }
    }
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        PublicAccount::from(account).into()
    }
}

/// Session response: account view plus the bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub account: AccountResponse,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            account: AccountResponse::from(&session.account),
            token: session.token.token,
            expires_at: session.token.expires_at,
        }
    }
}

/// Fresh token response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Register a local account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid payload or weak password"),
        (status = 409, description = "Email is already registered")
    )
)]
pub async fn register(
    State(server): State<StaynestServer>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    request.validate()?;

    let role = match request.role.as_deref() {
        None | Some("seeker") => Role::Seeker,
        Some("owner") => Role::Owner,
        Some(_) => return Err(ApiError::validation("Role must be seeker or owner")),
    };

    let session = server
        .identity
        .register_local(NewAccount {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(api_success(SessionResponse::from(session))),
    ))
}

/// Log in with local credentials
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authentication successful", body = SessionResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(server): State<StaynestServer>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    request.validate()?;

    let session = server
        .identity
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(api_success(SessionResponse::from(session))))
}

/// Federated login callback
///
/// The OAuth handshake happens in an external client; this endpoint
/// receives the already-extracted provider payload, resolves it to exactly
/// one account, and redirects to the configured post-login URL carrying
/// the issued token.
#[utoipa::path(
    get,
    path = "/api/v1/auth/{provider}/callback",
    tag = "authentication",
    params(
        ("provider" = String, Path, description = "Identity provider: google or facebook"),
        CallbackParams
    ),
    responses(
        (status = 303, description = "Session opened; redirect carries the token"),
        (status = 400, description = "Provider supplied no usable email"),
        (status = 404, description = "Unknown identity provider"),
        (status = 409, description = "Provider identity conflicts with an existing link")
    )
)]
pub async fn federated_callback(
    State(server): State<StaynestServer>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, ApiError> {
    let provider: Provider = provider
        .parse()
        .map_err(|_| ApiError::not_found("Unknown identity provider"))?;
    if !provider.is_federated() {
        return Err(ApiError::not_found("Unknown identity provider"));
    }
    if params.subject_id.trim().is_empty() {
        return Err(ApiError::validation("subject_id is required"));
    }

    let session = server
        .identity
        .federated_login(FederatedIdentity {
            provider,
            subject_id: params.subject_id,
            email: params.email,
            display_name: params.name,
            avatar_url: params.avatar_url,
        })
        .await?;

    // Token is base64url plus dots; safe as a query value without escaping.
    let url = format!(
        "{}?token={}",
        server.config.post_login_redirect, session.token.token
    );
    Ok(Redirect::to(&url))
}

/// Current account view
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Authenticated account", body = AccountResponse),
        (status = 401, description = "Missing, malformed or expired token"),
        (status = 403, description = "Account is inactive")
    ),
    security(("bearer_token" = []))
)]
pub async fn me(
    State(server): State<StaynestServer>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = server
        .accounts
        .find_by_id(principal.account_id)
        .await?
        .ok_or(IdentityError::AccountInactive)?;

    Ok(Json(api_success(AccountResponse::from(&account))))
}

/// Mint a fresh session token
///
/// An explicit operation on an already-valid session; the gate never
/// renews silently.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "authentication",
    responses(
        (status = 200, description = "Fresh token issued", body = TokenResponse),
        (status = 401, description = "Missing, malformed or expired token")
    ),
    security(("bearer_token" = []))
)]
pub async fn refresh(
    State(server): State<StaynestServer>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = server.identity.refresh(principal.account_id).await?;

    Ok(Json(api_success(TokenResponse {
        token: token.token,
        expires_at: token.expires_at,
    })))
}

/// Log out
///
/// Acknowledgment only: updates activity tracking. Issued tokens are not
/// persisted server-side, so they remain valid until natural expiry.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "authentication",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Missing, malformed or expired token")
    ),
    security(("bearer_token" = []))
)]
pub async fn logout(
    State(server): State<StaynestServer>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    server.identity.record_logout(principal.account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
