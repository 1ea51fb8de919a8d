use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::*;
use crate::password::PasswordHasher;
use crate::repository::AccountRepository;
use crate::tokens::{IssuedToken, SessionTokenService};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use uuid::Uuid;

const REFERRAL_CODE_LEN: usize = 8;

/// Local registration input. `role` may be `Seeker` or `Owner`; `Admin` is
/// rejected. Administrative roles are assigned out of band.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A successful authentication: the resolved account and its fresh token.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: IssuedToken,
}

pub struct IdentityService {
    accounts: Arc<dyn AccountRepository>,
    tokens: SessionTokenService,
    hasher: PasswordHasher,
    config: IdentityConfig,
}

impl IdentityService {
    pub fn new(accounts: Arc<dyn AccountRepository>, config: IdentityConfig) -> Result<Self> {
        let hasher = PasswordHasher::new(&config)?;
        let tokens = SessionTokenService::new(
            &config.token_secret,
            Duration::hours(config.session_ttl_hours),
        );

        Ok(Self {
            accounts,
            tokens,
            hasher,
            config,
        })
    }

    pub fn tokens(&self) -> &SessionTokenService {
        &self.tokens
    }

    /// Register a local account and open a session for it.
    pub async fn register_local(&self, new_account: NewAccount) -> Result<Session> {
        if new_account.role == Role::Admin {
            return Err(IdentityError::Forbidden);
        }
        self.validate_password(&new_account.password)?;

        let email = normalize_email(&new_account.email);
        if self
            .accounts
            .find_by_email(&email, Some(Provider::Local))
            .await?
            .is_some()
        {
            return Err(IdentityError::Conflict(format!(
                "email {email} is already registered"
            )));
        }

        let password_hash = self.hasher.hash(&new_account.password)?;
        let account = self
            .accounts
            .create(AccountDraft {
                name: new_account.name,
                email,
                password_hash: Some(password_hash),
                auth_provider: Provider::Local,
                provider_links: Vec::new(),
                role: new_account.role,
                is_verified: false,
                referral_code: self.generate_referral_code(),
                avatar_url: None,
            })
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "registered local account");
        self.open_session(account).await
    }

    /// Validate a local email/password pair.
    ///
    /// A missing account, a federated-only account (no password hash), and
    /// a wrong password are indistinguishable to the caller: all are
    /// `InvalidCredentials`. No side effects.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Account> {
        let email = normalize_email(email);
        let account = self
            .accounts
            .find_by_email(&email, Some(Provider::Local))
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let hash = account
            .password_hash
            .as_deref()
            .ok_or(IdentityError::InvalidCredentials)?;

        if !self.hasher.verify(password, hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Credential login: verify, record the login, open a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let account = self.verify_credentials(email, password).await?;
        self.open_session(account).await
    }

    /// Resolve a federated-login callback to exactly one account.
    ///
    /// Precedence, in order:
    /// 1. an account already holding this `(provider, subject_id)` link is
    ///    returned unchanged (the repeat-login path, no email needed);
    /// 2. an account owning the callback email gets the link attached,
    ///    unless it already has a different subject linked for this
    ///    provider (`ProviderConflict`);
    /// 3. a new account is created with the provider as its origin.
    pub async fn resolve_federated(&self, identity: FederatedIdentity) -> Result<Account> {
        if !identity.provider.is_federated() {
            return Err(IdentityError::Internal(anyhow::anyhow!(
                "{} is not a federated provider",
                identity.provider
            )));
        }

        if let Some(account) = self
            .accounts
            .find_by_provider_link(identity.provider, &identity.subject_id)
            .await?
        {
            return Ok(account);
        }

        let email = identity
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or(IdentityError::MissingEmail)?;

        if let Some(account) = self.accounts.find_by_email(&email, None).await? {
            // Step 1 missed, so any existing link for this provider points
            // at a different subject.
            if account.link_for(identity.provider).is_some() {
                tracing::warn!(
                    account_id = %account.id,
                    provider = %identity.provider,
                    "refusing to re-point an existing provider link"
                );
                return Err(IdentityError::ProviderConflict);
            }

            let updated = self
                .accounts
                .update(
                    account.id,
                    AccountUpdate {
                        add_provider_link: Some(ProviderLink {
                            provider: identity.provider,
                            subject_id: identity.subject_id,
                        }),
                        avatar_url: match account.avatar_url {
                            None => identity.avatar_url,
                            Some(_) => None,
                        },
                        ..AccountUpdate::default()
                    },
                )
                .await?;

            tracing::info!(
                account_id = %updated.id,
                provider = %identity.provider,
                "attached provider link to existing account"
            );
            return Ok(updated);
        }

        let account = self
            .accounts
            .create(AccountDraft {
                name: identity.display_name.unwrap_or_else(|| email.clone()),
                email,
                password_hash: None,
                auth_provider: identity.provider,
                provider_links: vec![ProviderLink {
                    provider: identity.provider,
                    subject_id: identity.subject_id,
                }],
                role: Role::Seeker,
                // Federated providers have verified the email themselves.
                is_verified: true,
                referral_code: self.generate_referral_code(),
                avatar_url: identity.avatar_url,
            })
            .await?;

        tracing::info!(
            account_id = %account.id,
            provider = %account.auth_provider,
            "created account from federated identity"
        );
        Ok(account)
    }

    /// Federated login: resolve, record the login, open a session.
    pub async fn federated_login(&self, identity: FederatedIdentity) -> Result<Session> {
        let account = self.resolve_federated(identity).await?;
        self.open_session(account).await
    }

    /// Resolve a bearer token to a request principal.
    ///
    /// Stateless signature/expiry check first, then a single account load;
    /// a deactivated or deleted account vetoes an otherwise-valid token.
    pub async fn authenticate_token(&self, token: &str) -> Result<Principal> {
        let account_id = self.tokens.verify(token)?;

        match self.accounts.find_by_id(account_id).await? {
            Some(account) if account.is_active => Ok(Principal {
                account_id: account.id,
                role: account.role,
                is_verified: account.is_verified,
            }),
            _ => Err(IdentityError::AccountInactive),
        }
    }

    /// Mint a fresh token for an already-authenticated principal.
    pub async fn refresh(&self, account_id: Uuid) -> Result<IssuedToken> {
        let token = self.tokens.issue(account_id)?;
        self.accounts
            .update(
                account_id,
                AccountUpdate {
                    last_active_at: Some(Utc::now()),
                    ..AccountUpdate::default()
                },
            )
            .await?;
        Ok(token)
    }

    /// Acknowledge a logout. Updates `last_active_at` only; issued tokens
    /// are not persisted and stay valid until natural expiry.
    pub async fn record_logout(&self, account_id: Uuid) -> Result<()> {
        self.accounts
            .update(
                account_id,
                AccountUpdate {
                    last_active_at: Some(Utc::now()),
                    ..AccountUpdate::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn open_session(&self, account: Account) -> Result<Session> {
        let now = Utc::now();
        let account = self
            .accounts
            .update(
                account.id,
                AccountUpdate {
                    last_login_at: Some(now),
                    last_active_at: Some(now),
                    ..AccountUpdate::default()
                },
            )
            .await?;

        let token = self.tokens.issue(account.id)?;
        Ok(Session { account, token })
    }

    fn validate_password(&self, password: &str) -> Result<()> {
        if password.len() < self.config.password_min_length {
            return Err(IdentityError::WeakPassword("too short"));
        }
        if self.config.password_require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(IdentityError::WeakPassword("must contain a digit"));
        }
        if self.config.password_require_letters && !password.chars().any(|c| c.is_alphabetic()) {
            return Err(IdentityError::WeakPassword("must contain a letter"));
        }
        Ok(())
    }

    fn generate_referral_code(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFERRAL_CODE_LEN)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect()
    }
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("session_ttl_hours", &self.config.session_ttl_hours)
            .finish()
    }
}
