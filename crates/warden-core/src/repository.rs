//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The directory is the sole
//! arbiter of consistency for concurrent mutations to one account:
//! anything that depends on the currently stored value goes through
//! [`AccountDirectory::update_if`].

use uuid::Uuid;

use crate::error::WardenResult;
use crate::models::account::{Account, CreateAccount, Precondition, UpdateAccount};

pub trait AccountDirectory: Send + Sync {
    /// Insert a new unverified account on the starter tier.
    ///
    /// Fails with `Conflict` when the email is already registered.
    fn create(&self, input: CreateAccount) -> impl Future<Output = WardenResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardenResult<Account>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = WardenResult<Account>> + Send;
    fn get_by_verification_token(
        &self,
        token: &str,
    ) -> impl Future<Output = WardenResult<Account>> + Send;
    /// Unconditional partial update.
    fn update(
        &self,
        id: Uuid,
        input: UpdateAccount,
    ) -> impl Future<Output = WardenResult<Account>> + Send;
    /// Compare-and-set: apply `input` only if `expected` holds against the
    /// stored record at the moment of writing.
    ///
    /// Returns `Ok(None)` when the precondition does not hold or the
    /// account does not exist.
    fn update_if(
        &self,
        id: Uuid,
        expected: Precondition,
        input: UpdateAccount,
    ) -> impl Future<Output = WardenResult<Option<Account>>> + Send;
}
