use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an account authenticates: locally with a password, or through an
/// external identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    /// True for providers that perform their own email verification.
    pub fn is_federated(&self) -> bool {
        !matches!(self, Provider::Local)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Provider::Local),
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Parse error for [`Provider`].
#[derive(Debug, Clone)]
pub struct UnknownProvider(pub String);

impl std::fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown identity provider: {}", self.0)
    }
}

impl std::error::Error for UnknownProvider {}

/// Account role. Assigned once at registration and changed only by an
/// explicit administrative action; never auto-escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external identity linked to an account. The
/// `(provider, subject_id)` pair is unique across all accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLink {
    pub provider: Provider,
    pub subject_id: String,
}

/// The durable identity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Normalized (trimmed, lowercased). Unique among local accounts.
    pub email: String,
    /// PHC-formatted Argon2id hash. `None` for purely-federated accounts.
    pub password_hash: Option<String>,
    /// The provider the account was created through.
    pub auth_provider: Provider,
    pub provider_links: Vec<ProviderLink>,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub referral_code: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Account {
    /// The link registered for `provider`, if any.
    pub fn link_for(&self, provider: Provider) -> Option<&ProviderLink> {
        self.provider_links.iter().find(|l| l.provider == provider)
    }
}

/// Everything the store needs to create an account; the store assigns the
/// id and creation timestamps.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub auth_provider: Provider,
    pub provider_links: Vec<ProviderLink>,
    pub role: Role,
    pub is_verified: bool,
    pub referral_code: String,
    pub avatar_url: Option<String>,
}

/// Partial update applied through `AccountRepository::update`. Fields left
/// as `None` are untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// Attach one more provider link. The store rejects the update with a
    /// conflict if the `(provider, subject_id)` pair is already claimed.
    pub add_provider_link: Option<ProviderLink>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub avatar_url: Option<String>,
}

/// The outward-facing account view. Never carries the password hash or the
/// raw provider links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub referral_code: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            is_active: account.is_active,
            is_verified: account.is_verified,
            referral_code: account.referral_code.clone(),
            avatar_url: account.avatar_url.clone(),
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}

/// The authenticated identity attached to a single in-flight request.
/// Built per request by the authentication middleware; never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
    pub is_verified: bool,
}

/// Federated-login callback payload, already extracted from the provider
/// response by the external OAuth client.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub provider: Provider,
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Canonical form used for all email lookups and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
