//! Account service — registration, login/logout, subscription,
//! verification and avatar orchestration.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;
use warden_avatar::{AvatarPipeline, StagedUpload};
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::account::{
    Account, CreateAccount, Precondition, SubscriptionTier, UpdateAccount,
};
use warden_core::notification::Notification;
use warden_core::repository::AccountDirectory;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::NotificationDispatcher;
use crate::password::CredentialHasher;
use crate::session::SessionValidator;
use crate::token::TokenIssuer;
use crate::verification::VerificationTokenManager;

pub const EMAIL_IN_USE: &str = "Email in use";

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token, also stored on the account.
    pub token: String,
    pub account: Account,
    /// Session token lifetime in seconds.
    pub expires_in: u64,
}

/// Account service.
///
/// Generic over the directory implementation so that this layer has
/// no dependency on the database crate.
#[derive(Clone)]
pub struct AccountService<D: AccountDirectory + Clone> {
    directory: D,
    hasher: Arc<CredentialHasher>,
    tokens: TokenIssuer,
    sessions: SessionValidator<D>,
    verification: VerificationTokenManager<D>,
    avatars: AvatarPipeline,
    notifier: NotificationDispatcher,
    config: AuthConfig,
}

impl<D: AccountDirectory + Clone> AccountService<D> {
    pub fn new(
        directory: D,
        avatars: AvatarPipeline,
        notifier: NotificationDispatcher,
        config: AuthConfig,
    ) -> WardenResult<Self> {
        let hasher = Arc::new(CredentialHasher::new(&config)?);
        let tokens = TokenIssuer::new(&config)?;

        Ok(Self {
            sessions: SessionValidator::new(tokens.clone(), directory.clone()),
            verification: VerificationTokenManager::new(directory.clone()),
            directory,
            hasher,
            tokens,
            avatars,
            notifier,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn avatars(&self) -> &AvatarPipeline {
        &self.avatars
    }

    /// Create an unverified account and queue its verification email.
    pub async fn register(&self, input: RegisterInput) -> WardenResult<Account> {
        let email = normalize_email(&input.email);

        match self.directory.get_by_email(&email).await {
            Ok(_) => return Err(WardenError::conflict(EMAIL_IN_USE)),
            Err(WardenError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let password_hash = self.hash_password(input.password).await?;
        let verification_token = self.verification.generate();

        // The directory's unique index settles concurrent registrations.
        let account = self
            .directory
            .create(CreateAccount {
                name: input.name,
                avatar_url: gravatar_url(&email),
                email,
                password_hash,
                verification_token: verification_token.clone(),
            })
            .await?;

        self.notifier.enqueue(Notification::verification(
            &account.email,
            &self.config.public_base_url,
            &verification_token,
        ));

        info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Check credentials and issue a new session token.
    ///
    /// Unknown email and wrong password produce the same error. A new
    /// login replaces, and thereby revokes, any previous session.
    pub async fn login(&self, input: LoginInput) -> WardenResult<LoginOutput> {
        let email = normalize_email(&input.email);

        let account = match self.directory.get_by_email(&email).await {
            Ok(account) => account,
            Err(WardenError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        if !self
            .verify_password(input.password, account.password_hash.clone())
            .await?
        {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.tokens.issue(account.id)?;
        let account = self
            .directory
            .update(
                account.id,
                UpdateAccount {
                    session_token: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;

        info!(account_id = %account.id, "Login succeeded");
        Ok(LoginOutput {
            token,
            account,
            expires_in: self.config.session_token_lifetime_secs,
        })
    }

    /// Resolve a bearer token to its account.
    pub async fn authenticate(&self, token: &str) -> WardenResult<Account> {
        self.sessions.authenticate(token).await
    }

    /// Clear the stored session, but only if `token` is still the current one.
    pub async fn logout(&self, account_id: Uuid, token: &str) -> WardenResult<()> {
        let cleared = self
            .directory
            .update_if(
                account_id,
                Precondition::SessionToken(token.to_string()),
                UpdateAccount {
                    session_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        match cleared {
            Some(_) => {
                info!(%account_id, "Logged out");
                Ok(())
            }
            None => Err(AuthError::SessionRevoked.into()),
        }
    }

    pub async fn change_subscription(
        &self,
        account_id: Uuid,
        subscription: &str,
    ) -> WardenResult<Account> {
        let tier: SubscriptionTier = subscription.parse()?;
        let account = self
            .directory
            .update(
                account_id,
                UpdateAccount {
                    subscription: Some(tier),
                    ..Default::default()
                },
            )
            .await?;

        info!(%account_id, subscription = %tier, "Subscription changed");
        Ok(account)
    }

    pub async fn verify_email(&self, token: &str) -> WardenResult<Account> {
        self.verification.consume(token).await
    }

    /// Re-send the pending verification email for `email`.
    pub async fn resend_verification(&self, email: &str) -> WardenResult<()> {
        let email = normalize_email(email);
        let (account, token) = self.verification.reissue(&email).await?;

        self.notifier.enqueue(Notification::verification(
            &account.email,
            &self.config.public_base_url,
            &token,
        ));

        info!(account_id = %account.id, "Verification email re-queued");
        Ok(())
    }

    /// Publish a staged avatar and point the account at it.
    ///
    /// `avatar_url` changes only after the file is in place.
    pub async fn replace_avatar(
        &self,
        account_id: Uuid,
        upload: StagedUpload,
    ) -> WardenResult<Account> {
        let published = self
            .avatars
            .ingest(&account_id.to_string(), upload)
            .await?;

        self.directory
            .update(
                account_id,
                UpdateAccount {
                    avatar_url: Some(published.url),
                    ..Default::default()
                },
            )
            .await
    }

    async fn hash_password(&self, password: String) -> WardenResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| WardenError::Internal(format!("hash task failed: {e}")))?
            .map_err(Into::into)
    }

    async fn verify_password(&self, password: String, hash: String) -> WardenResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| WardenError::Internal(format!("verify task failed: {e}")))?
            .map_err(Into::into)
    }
}

/// Trimmed, lower-cased form used for every lookup and insert.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Placeholder avatar derived from the email address.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=250&d=identicon",
        hex::encode(digest)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn gravatar_is_stable_and_opaque() {
        let a = gravatar_url("alice@example.com");
        assert_eq!(a, gravatar_url("alice@example.com"));
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
        assert!(!a.contains("alice"));
    }
}
