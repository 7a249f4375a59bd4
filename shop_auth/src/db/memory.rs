//! In-memory credential store.
//!
//! Used for local development (`--in-memory`) and by tests. Not durable.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::repository::CredentialStore;
use crate::auth::{Account, AccountId, NewAccount, ProfileUpdate};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
}

/// Credential store backed by process memory
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, account_id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(&account_id).cloned())
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        // Check and insert under one write guard so concurrent registrations
        // of the same email serialize here.
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let stored = Account {
            id: Uuid::new_v4(),
            email: account.email,
            credential_hash: account.credential_hash,
            role: account.role,
            display_name: account.display_name,
            active: account.active,
            created_at: Utc::now(),
        };
        inner.by_email.insert(stored.email.clone(), stored.id);
        inner.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_profile(
        &self,
        account_id: AccountId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let mut inner = self.inner.write().await;
        let Some(account) = inner.accounts.get_mut(&account_id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            account.display_name = name.clone();
        }
        Ok(Some(account.clone()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
