use anyhow::Result;
use identity_engine::{
    AccountRepository, IdentityConfig, IdentityService, InMemoryAccountRepository,
    DEFAULT_SESSION_TTL_HOURS,
};
use std::sync::Arc;

/// Main Staynest server state.
#[derive(Clone)]
pub struct StaynestServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Identity and session-authorization service
    pub identity: Arc<IdentityService>,
    /// Account store handle (injected; in-memory by default for dev)
    pub accounts: Arc<dyn AccountRepository>,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,
    /// Bind address for the HTTP listener
    pub bind_addr: String,
    /// Where federated callbacks redirect after a session is opened;
    /// the issued token is appended as a `token` query parameter.
    pub post_login_redirect: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "Staynest Engine".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            post_login_redirect: "http://localhost:3000/auth/callback".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: defaults.name,
            bind_addr: std::env::var("STAYNEST_BIND_ADDR").unwrap_or(defaults.bind_addr),
            post_login_redirect: std::env::var("STAYNEST_POST_LOGIN_REDIRECT")
                .unwrap_or(defaults.post_login_redirect),
        }
    }
}

/// Load identity configuration from environment, falling back to defaults.
/// The token secret is read once here and never mutated afterwards.
pub fn identity_config_from_env() -> IdentityConfig {
    let mut config = IdentityConfig::default();

    match std::env::var("SESSION_TOKEN_SECRET") {
        Ok(secret) => config.token_secret = secret,
        Err(_) => {
            tracing::warn!("SESSION_TOKEN_SECRET is not set; using the development default");
        }
    }
    config.session_ttl_hours = std::env::var("SESSION_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

    config
}

impl StaynestServer {
    /// Create a server instance backed by the in-memory account store.
    pub fn new(config: ServerConfig, identity_config: IdentityConfig) -> Result<Self> {
        let accounts: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
        Self::with_repository(config, identity_config, accounts)
    }

    /// Create a server instance with an injected account store.
    /// This is useful for testing and for real deployments.
    pub fn with_repository(
        config: ServerConfig,
        identity_config: IdentityConfig,
        accounts: Arc<dyn AccountRepository>,
    ) -> Result<Self> {
        let identity = Arc::new(IdentityService::new(accounts.clone(), identity_config)?);

        Ok(Self {
            config,
            identity,
            accounts,
        })
    }
}

impl std::fmt::Debug for StaynestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaynestServer")
            .field("config", &self.config)
            .finish()
    }
}
