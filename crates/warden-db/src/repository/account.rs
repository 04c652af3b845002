//! SurrealDB implementation of [`AccountDirectory`].
//!
//! Conditional updates are single `UPDATE ... WHERE` statements, so the
//! precondition check and the write happen in one store transaction.
//! Writers that lose an optimistic commit race are resolved against the
//! committed state instead of surfacing the engine's conflict error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::method::Query;
use surrealdb::{Connection, Surreal};
use tracing::debug;
use uuid::Uuid;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::account::{
    Account, CreateAccount, Precondition, SubscriptionTier, UpdateAccount,
};
use warden_core::repository::AccountDirectory;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct AccountRow {
    name: String,
    email: String,
    password_hash: String,
    subscription: String,
    #[serde(default)]
    session_token: Option<String>,
    avatar_url: String,
    verified: bool,
    #[serde(default)]
    verification_token: Option<String>,
    created_at: String,
    updated_at: String,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct AccountRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    subscription: String,
    #[serde(default)]
    session_token: Option<String>,
    avatar_url: String,
    verified: bool,
    #[serde(default)]
    verification_token: Option<String>,
    created_at: String,
    updated_at: String,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Result<Account, DbError> {
        let subscription: SubscriptionTier = self
            .subscription
            .parse()
            .map_err(|_| DbError::Corrupt(format!("unknown subscription: {}", self.subscription)))?;
        Ok(Account {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            subscription,
            session_token: self.session_token,
            avatar_url: self.avatar_url,
            verified: self.verified,
            verification_token: self.verification_token,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        AccountRow {
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            subscription: self.subscription,
            session_token: self.session_token,
            avatar_url: self.avatar_url,
            verified: self.verified,
            verification_token: self.verification_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_account(id)
    }
}

/// SurrealDB reports unique index violations as
/// "Database index `...` already contains ...".
fn is_duplicate_email(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("idx_account_email") && msg.contains("already contains")
}

/// SET clauses for the fields present in `input`.
fn set_clauses(input: &UpdateAccount) -> Vec<&'static str> {
    let mut sets = Vec::new();
    if input.subscription.is_some() {
        sets.push("subscription = $subscription");
    }
    if input.session_token.is_some() {
        sets.push("session_token = $session_token");
    }
    if input.avatar_url.is_some() {
        sets.push("avatar_url = $avatar_url");
    }
    if input.verified.is_some() {
        sets.push("verified = $verified");
    }
    if input.verification_token.is_some() {
        sets.push("verification_token = $verification_token");
    }
    sets.push("updated_at = $updated_at");
    sets
}

fn bind_update<'r, C: Connection>(mut builder: Query<'r, C>, input: UpdateAccount) -> Query<'r, C> {
    if let Some(subscription) = input.subscription {
        builder = builder.bind(("subscription", subscription.as_str()));
    }
    if let Some(session_token) = input.session_token {
        // Some(None) binds NONE, which clears the field.
        builder = builder.bind(("session_token", session_token));
    }
    if let Some(avatar_url) = input.avatar_url {
        builder = builder.bind(("avatar_url", avatar_url));
    }
    if let Some(verified) = input.verified {
        builder = builder.bind(("verified", verified));
    }
    if let Some(verification_token) = input.verification_token {
        builder = builder.bind(("verification_token", verification_token));
    }
    builder.bind(("updated_at", Utc::now().to_rfc3339()))
}

/// SurrealDB implementation of the account directory.
pub struct SurrealAccountDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealAccountDirectory<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealAccountDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_one(&self, field: &'static str, value: &str) -> WardenResult<Account> {
        let query = format!("SELECT meta::id(id) AS record_id, * FROM account WHERE {field} = $value");

        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "Account".into(),
            id: field.to_string(),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn run_update(
        &self,
        id: Uuid,
        condition: Option<(&'static str, String)>,
        input: UpdateAccount,
    ) -> Result<Option<Account>, DbError> {
        let mut query = format!(
            "UPDATE type::thing('account', $id) SET {}",
            set_clauses(&input).join(", ")
        );
        if let Some((clause, _)) = &condition {
            query.push_str(" WHERE ");
            query.push_str(clause);
        }

        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        if let Some((_, expected)) = condition {
            builder = builder.bind(("expected", expected));
        }
        builder = bind_update(builder, input);

        let result = builder.await.map_err(DbError::from_query)?;
        let mut result = result.check().map_err(DbError::from_query)?;

        let rows: Vec<AccountRow> = result.take(0)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_account(id)?)),
            None => Ok(None),
        }
    }

    async fn try_create(&self, input: &CreateAccount) -> Result<Account, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().to_rfc3339();

        let result = self
            .db
            .query(
                "CREATE type::thing('account', $id) SET \
                 name = $name, email = $email, \
                 password_hash = $password_hash, \
                 subscription = $subscription, \
                 session_token = NONE, \
                 avatar_url = $avatar_url, \
                 verified = false, \
                 verification_token = $verification_token, \
                 created_at = $now, updated_at = $now",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name.clone()))
            .bind(("email", input.email.clone()))
            .bind(("password_hash", input.password_hash.clone()))
            .bind(("subscription", SubscriptionTier::default().as_str()))
            .bind(("avatar_url", input.avatar_url.clone()))
            .bind(("verification_token", input.verification_token.clone()))
            .bind(("now", now))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(|e| {
            if is_duplicate_email(&e) {
                DbError::DuplicateEmail
            } else {
                DbError::from_query(e)
            }
        })?;

        let rows: Vec<AccountRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "Account".into(),
            id: id_str,
        })?;

        row.into_account(id)
    }
}

/// Attempts per write before a commit conflict is reported as an error.
const MAX_WRITE_ATTEMPTS: u32 = 16;

async fn conflict_backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 5)).await;
}

impl<C: Connection> AccountDirectory for SurrealAccountDirectory<C> {
    /// A writer that loses a commit race re-checks the email: if the
    /// winner took it, this is a duplicate; otherwise the insert is retried.
    async fn create(&self, input: CreateAccount) -> WardenResult<Account> {
        let mut attempt = 1;
        loop {
            match self.try_create(&input).await {
                Err(DbError::TransactionConflict(msg)) => {
                    match self.get_by_email(&input.email).await {
                        Ok(_) => return Err(DbError::DuplicateEmail.into()),
                        Err(WardenError::NotFound { .. }) => {}
                        Err(e) => return Err(e),
                    }
                    if attempt >= MAX_WRITE_ATTEMPTS {
                        return Err(DbError::TransactionConflict(msg).into());
                    }
                    debug!(attempt, "Account insert lost a commit race, retrying");
                    conflict_backoff(attempt).await;
                    attempt += 1;
                }
                other => return Ok(other?),
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> WardenResult<Account> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "Account".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_email(&self, email: &str) -> WardenResult<Account> {
        self.select_one("email", email).await
    }

    async fn get_by_verification_token(&self, token: &str) -> WardenResult<Account> {
        self.select_one("verification_token", token).await
    }

    async fn update(&self, id: Uuid, input: UpdateAccount) -> WardenResult<Account> {
        let mut attempt = 1;
        let updated = loop {
            match self.run_update(id, None, input.clone()).await {
                Err(DbError::TransactionConflict(_)) if attempt < MAX_WRITE_ATTEMPTS => {
                    debug!(account_id = %id, attempt, "Account update lost a commit race, retrying");
                    conflict_backoff(attempt).await;
                    attempt += 1;
                }
                other => break other?,
            }
        };

        updated.ok_or_else(|| {
            DbError::NotFound {
                entity: "Account".into(),
                id: id.to_string(),
            }
            .into()
        })
    }

    /// On a lost commit race the record is re-read: if the precondition
    /// no longer holds the concurrent writer won and this returns `None`.
    async fn update_if(
        &self,
        id: Uuid,
        expected: Precondition,
        input: UpdateAccount,
    ) -> WardenResult<Option<Account>> {
        let condition = match &expected {
            Precondition::SessionToken(token) => ("session_token = $expected", token.clone()),
            Precondition::PendingVerification(token) => (
                "verified = false AND verification_token = $expected",
                token.clone(),
            ),
        };

        let mut attempt = 1;
        loop {
            match self
                .run_update(id, Some(condition.clone()), input.clone())
                .await
            {
                Err(DbError::TransactionConflict(msg)) => {
                    match self.get_by_id(id).await {
                        Ok(current) if expected.holds(&current) => {}
                        Ok(_) | Err(WardenError::NotFound { .. }) => {
                            debug!(account_id = %id, "Conditional update lost to a concurrent writer");
                            return Ok(None);
                        }
                        Err(e) => return Err(e),
                    }
                    if attempt >= MAX_WRITE_ATTEMPTS {
                        return Err(DbError::TransactionConflict(msg).into());
                    }
                    conflict_backoff(attempt).await;
                    attempt += 1;
                }
                Ok(None) => {
                    debug!(account_id = %id, "Conditional update precondition failed");
                    return Ok(None);
                }
                other => return Ok(other?),
            }
        }
    }
}
