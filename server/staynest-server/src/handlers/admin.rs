//! Administrative handlers. Routed behind the authentication middleware
//! plus a `require_role([Admin])` guard.

use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::auth::AccountResponse;
use crate::server::StaynestServer;
use axum::{
    extract::{Path, State},
    Json,
};
use identity_engine::AccountRepository;
use uuid::Uuid;

/// Inspect any account by id
#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts/{id}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Account id")
    ),
    responses(
        (status = 200, description = "Account view", body = AccountResponse),
        (status = 401, description = "Missing, malformed or expired token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_token" = []))
)]
pub async fn get_account(
    State(server): State<StaynestServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = server
        .accounts
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(api_success(AccountResponse::from(&account))))
}
