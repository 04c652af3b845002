//! Session validation: signature check AND stored-token equality.

use tracing::debug;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::account::Account;
use warden_core::repository::AccountDirectory;

use crate::error::AuthError;
use crate::token::TokenIssuer;

/// Resolves a presented bearer token to the account it belongs to.
///
/// A token is accepted only if it verifies cryptographically *and* is
/// the exact value currently stored on the account. Logout and re-login
/// revoke tokens through the second check alone.
#[derive(Clone)]
pub struct SessionValidator<D: AccountDirectory> {
    issuer: TokenIssuer,
    directory: D,
}

impl<D: AccountDirectory> SessionValidator<D> {
    pub fn new(issuer: TokenIssuer, directory: D) -> Self {
        Self { issuer, directory }
    }

    pub async fn authenticate(&self, token: &str) -> WardenResult<Account> {
        let claims = self.issuer.validate(token).inspect_err(|e| {
            debug!(error = %e, "Rejected session token");
        })?;
        let account_id = claims.account_id()?;

        let account = match self.directory.get_by_id(account_id).await {
            Ok(account) => account,
            Err(WardenError::NotFound { .. }) => return Err(AuthError::SessionRevoked.into()),
            Err(e) => return Err(e),
        };

        if account.session_token.as_deref() != Some(token) {
            debug!(account_id = %account.id, "Session token no longer current");
            return Err(AuthError::SessionRevoked.into());
        }

        Ok(account)
    }
}
