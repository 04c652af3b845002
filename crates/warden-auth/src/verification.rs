//! Single-use email verification tokens.

use tracing::{debug, info};
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::account::{Account, Precondition, UpdateAccount};
use warden_core::repository::AccountDirectory;

use crate::token;

pub const ALREADY_VERIFIED: &str = "Verification has already been passed";

/// Mints verification tokens and consumes them against the directory.
#[derive(Clone)]
pub struct VerificationTokenManager<D: AccountDirectory> {
    directory: D,
}

impl<D: AccountDirectory> VerificationTokenManager<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Random URL-safe token. Collisions are left to the directory.
    pub fn generate(&self) -> String {
        token::generate_opaque_token()
    }

    /// Mark the account owning `token` as verified and clear the token.
    ///
    /// The flip is a compare-and-set on the stored token, so of two
    /// concurrent calls with the same token exactly one succeeds; the
    /// other observes `NotFound` or `Conflict`.
    pub async fn consume(&self, token: &str) -> WardenResult<Account> {
        let account = self
            .directory
            .get_by_verification_token(token)
            .await
            .map_err(|e| match e {
                WardenError::NotFound { .. } => WardenError::not_found("User", "verification_token"),
                other => other,
            })?;

        if account.verified {
            return Err(WardenError::conflict(ALREADY_VERIFIED));
        }

        let updated = self
            .directory
            .update_if(
                account.id,
                Precondition::PendingVerification(token.to_string()),
                UpdateAccount {
                    verified: Some(true),
                    verification_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        match updated {
            Some(account) => {
                info!(account_id = %account.id, "Email verified");
                Ok(account)
            }
            None => {
                debug!(account_id = %account.id, "Verification token consumed concurrently");
                Err(WardenError::not_found("User", "verification_token"))
            }
        }
    }

    /// Look up an unverified account by email and return it with its
    /// pending token, so the caller can re-send the notification.
    pub async fn reissue(&self, email: &str) -> WardenResult<(Account, String)> {
        let account = self.directory.get_by_email(email).await?;

        if account.verified {
            return Err(WardenError::conflict(ALREADY_VERIFIED));
        }

        match account.verification_token.clone() {
            Some(token) => Ok((account, token)),
            None => Err(WardenError::Internal(format!(
                "unverified account {} has no verification token",
                account.id
            ))),
        }
    }
}
