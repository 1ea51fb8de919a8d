use crate::error::{IdentityError, Result};
use crate::models::*;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The account store contract. Implementations must enforce two uniqueness
/// constraints atomically with the write that could violate them:
///
/// - `email` is unique among accounts with `auth_provider = local`;
/// - a `(provider, subject_id)` pair is claimed by at most one account.
///
/// A violated constraint is reported as [`IdentityError::Conflict`]; under
/// concurrent duplicate writes the store rejects the second writer rather
/// than merging or overwriting. Federated-login races for a brand-new
/// subject id are only duplicate-safe when the link constraint holds
/// atomically.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, draft: AccountDraft) -> Result<Account>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    /// Look up by normalized email, optionally restricted to accounts
    /// created through `provider`.
    async fn find_by_email(&self, email: &str, provider: Option<Provider>)
        -> Result<Option<Account>>;
    async fn find_by_provider_link(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> Result<Option<Account>>;
    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<Account>;
}

/// In-memory implementation for development and testing. Both uniqueness
/// checks run under a single write lock, so the concurrent-writer behavior
/// matches what the trait requires of a real store.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    /// Deactivate an account. Administrative surface used by tests and
    /// operational tooling; not part of the authentication flows.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| IdentityError::Internal(anyhow::anyhow!("account {id} not found")))?;
        account.is_active = is_active;
        account.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, draft: AccountDraft) -> Result<Account> {
        let mut accounts = self.accounts.write().await;

        if draft.auth_provider == Provider::Local {
            let taken = accounts
                .values()
                .any(|a| a.auth_provider == Provider::Local && a.email == draft.email);
            if taken {
                return Err(IdentityError::Conflict(format!(
                    "email {} is already registered",
                    draft.email
                )));
            }
        }

        for link in &draft.provider_links {
            let claimed = accounts
                .values()
                .any(|a| a.link_for(link.provider).map(|l| l.subject_id.as_str())
                    == Some(link.subject_id.as_str()));
            if claimed {
                return Err(IdentityError::Conflict(format!(
                    "{} identity is already linked to an account",
                    link.provider
                )));
            }
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            password_hash: draft.password_hash,
            auth_provider: draft.auth_provider,
            provider_links: draft.provider_links,
            role: draft.role,
            is_active: true,
            is_verified: draft.is_verified,
            referral_code: draft.referral_code,
            avatar_url: draft.avatar_url,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            last_active_at: None,
        };

        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
        provider: Option<Provider>,
    ) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.email == email && provider.map_or(true, |p| p == a.auth_provider))
            .cloned())
    }

    async fn find_by_provider_link(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.link_for(provider).map(|l| l.subject_id.as_str()) == Some(subject_id))
            .cloned())
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<Account> {
        let mut accounts = self.accounts.write().await;

        if let Some(link) = &update.add_provider_link {
            let claimed_elsewhere = accounts.values().any(|a| {
                a.id != id
                    && a.link_for(link.provider).map(|l| l.subject_id.as_str())
                        == Some(link.subject_id.as_str())
            });
            if claimed_elsewhere {
                return Err(IdentityError::Conflict(format!(
                    "{} identity is already linked to another account",
                    link.provider
                )));
            }
        }

        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| IdentityError::Internal(anyhow::anyhow!("account {id} not found")))?;

        if let Some(link) = update.add_provider_link {
            match account.link_for(link.provider) {
                // A link, once set, is never re-pointed.
                Some(existing) if existing.subject_id != link.subject_id => {
                    return Err(IdentityError::Conflict(format!(
                        "account already has a {} link",
                        link.provider
                    )));
                }
                Some(_) => {}
                None => account.provider_links.push(link),
            }
        }
        if let Some(at) = update.last_login_at {
            account.last_login_at = Some(at);
        }
        if let Some(at) = update.last_active_at {
            account.last_active_at = Some(at);
        }
        if let Some(url) = update.avatar_url {
            account.avatar_url = Some(url);
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }
}
