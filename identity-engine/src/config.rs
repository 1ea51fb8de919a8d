use serde::{Deserialize, Serialize};

/// Session-token lifetime default: 7 days.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Process-wide signing secret. Loaded once at startup, never mutated;
    /// rotating it invalidates every outstanding session.
    pub token_secret: String,
    pub session_ttl_hours: i64,
    /// Argon2id cost parameters.
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    /// Password policy applied at local registration.
    pub password_min_length: usize,
    pub password_require_numbers: bool,
    pub password_require_letters: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_secret: "change-me-in-production".to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            // OWASP-recommended Argon2id parameters: 19 MiB, t=2, p=1
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            password_min_length: 6,
            password_require_numbers: true,
            password_require_letters: true,
        }
    }
}
