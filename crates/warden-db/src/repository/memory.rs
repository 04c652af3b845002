//! In-process [`AccountDirectory`] for single-node deployments and tests.
//!
//! Every operation holds the write lock for its whole check-then-write,
//! which gives the same atomicity as a conditional store update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::account::{
    Account, CreateAccount, Precondition, SubscriptionTier, UpdateAccount,
};
use warden_core::repository::AccountDirectory;

use crate::error::DbError;

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
}

/// Shared handle; clones see the same accounts.
#[derive(Clone, Default)]
pub struct MemoryAccountDirectory {
    state: Arc<RwLock<State>>,
}

impl MemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn not_found(id: impl Into<String>) -> WardenError {
    WardenError::not_found("Account", id)
}

impl AccountDirectory for MemoryAccountDirectory {
    async fn create(&self, input: CreateAccount) -> WardenResult<Account> {
        let mut state = self.state.write().await;
        if state.by_email.contains_key(&input.email) {
            return Err(DbError::DuplicateEmail.into());
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            subscription: SubscriptionTier::default(),
            session_token: None,
            avatar_url: input.avatar_url,
            verified: false,
            verification_token: Some(input.verification_token),
            created_at: now,
            updated_at: now,
        };

        state.by_email.insert(account.email.clone(), account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> WardenResult<Account> {
        self.state
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id.to_string()))
    }

    async fn get_by_email(&self, email: &str) -> WardenResult<Account> {
        let state = self.state.read().await;
        state
            .by_email
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned()
            .ok_or_else(|| not_found("email"))
    }

    async fn get_by_verification_token(&self, token: &str) -> WardenResult<Account> {
        self.state
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.verification_token.as_deref() == Some(token))
            .cloned()
            .ok_or_else(|| not_found("verification_token"))
    }

    async fn update(&self, id: Uuid, input: UpdateAccount) -> WardenResult<Account> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| not_found(id.to_string()))?;
        input.apply(account, Utc::now());
        Ok(account.clone())
    }

    async fn update_if(
        &self,
        id: Uuid,
        expected: Precondition,
        input: UpdateAccount,
    ) -> WardenResult<Option<Account>> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&id) {
            Some(account) if expected.holds(account) => {
                input.apply(account, Utc::now());
                Ok(Some(account.clone()))
            }
            _ => Ok(None),
        }
    }
}
