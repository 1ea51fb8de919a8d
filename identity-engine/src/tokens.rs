//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret and are never
//! persisted; a token dies by reaching its expiry or by the secret being
//! rotated. Verification is a pure function of the token and the secret,
//! with no store or network access.

use crate::error::{IdentityError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account id.
    pub sub: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

/// A freshly minted token together with its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    validation: Validation,
}

impl SessionTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Zero clock-skew tolerance: the expiry boundary is exact.
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            validation,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a signed token for `account_id`, expiring `ttl` from now.
    pub fn issue(&self, account_id: Uuid) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::Internal(anyhow::anyhow!("token encoding failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the subject account id.
    ///
    /// Signature is checked before expiry; a tampered or structurally
    /// invalid token is [`IdentityError::TokenMalformed`], an expired one
    /// is [`IdentityError::TokenExpired`].
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| IdentityError::TokenMalformed)
    }
}

impl std::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> IdentityError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
        _ => IdentityError::TokenMalformed,
    }
}
