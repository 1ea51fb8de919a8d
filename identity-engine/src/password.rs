//! Password hashing with Argon2id.
//!
//! Hashes are salted PHC strings; verification is the argon2 crate's
//! constant-time comparison. Cost parameters come from [`IdentityConfig`].

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher from the configured cost factors.
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "invalid argon2 parameters");
            IdentityError::Hashing
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password into a PHC-formatted string with a fresh
    /// random salt.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing failed");
                IdentityError::Hashing
            })?;

        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; an unparseable hash is an error
    /// rather than a silent non-match.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|_| IdentityError::Hashing)?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Ok(false),
        }
    }
}
