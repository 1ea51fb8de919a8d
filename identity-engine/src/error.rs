use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity provider supplied no usable email")]
    MissingEmail,

    #[error("Provider identity is already linked to another subject")]
    ProviderConflict,

    #[error("Session token has expired")]
    TokenExpired,

    #[error("Session token is malformed or has an invalid signature")]
    TokenMalformed,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Account is inactive or no longer exists")]
    AccountInactive,

    #[error("No authenticated principal on request")]
    Unauthenticated,

    #[error("Role is not allowed for this operation")]
    Forbidden,

    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    #[error("Password too weak: {0}")]
    WeakPassword(&'static str),

    #[error("Password hashing error")]
    Hashing,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IdentityError {
    /// True for failures produced by token verification alone, before any
    /// account state is consulted.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            IdentityError::TokenExpired | IdentityError::TokenMalformed | IdentityError::MissingToken
        )
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
