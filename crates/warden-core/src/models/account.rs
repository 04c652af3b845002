//! Account domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WardenError;

/// Flat subscription tier. New accounts start on [`SubscriptionTier::Starter`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Starter,
    Pro,
    Business,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [Self::Starter, Self::Pro, Self::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| WardenError::validation("Subscription type is wrong"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub subscription: SubscriptionTier,
    /// Last issued session token; `None` while logged out.
    pub session_token: Option<String>,
    pub avatar_url: String,
    pub verified: bool,
    /// Present exactly while `verified` is false.
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    /// Already-hashed password. The directory never sees plaintext.
    pub password_hash: String,
    pub avatar_url: String,
    pub verification_token: String,
}

/// Partial update. Outer `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub subscription: Option<SubscriptionTier>,
    pub session_token: Option<Option<String>>,
    pub avatar_url: Option<String>,
    pub verified: Option<bool>,
    pub verification_token: Option<Option<String>>,
}

/// Precondition on the stored state checked atomically by
/// [`AccountDirectory::update_if`](crate::repository::AccountDirectory::update_if).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The stored session token equals the given value.
    SessionToken(String),
    /// The account is unverified and its verification token equals the
    /// given value.
    PendingVerification(String),
}

impl Precondition {
    pub fn holds(&self, account: &Account) -> bool {
        match self {
            Self::SessionToken(expected) => account.session_token.as_deref() == Some(expected),
            Self::PendingVerification(expected) => {
                !account.verified && account.verification_token.as_deref() == Some(expected)
            }
        }
    }
}

impl UpdateAccount {
    /// Apply the update to an in-memory account.
    pub fn apply(self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(subscription) = self.subscription {
            account.subscription = subscription;
        }
        if let Some(session_token) = self.session_token {
            account.session_token = session_token;
        }
        if let Some(avatar_url) = self.avatar_url {
            account.avatar_url = avatar_url;
        }
        if let Some(verified) = self.verified {
            account.verified = verified;
        }
        if let Some(verification_token) = self.verification_token {
            account.verification_token = verification_token;
        }
        account.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$...".into(),
            subscription: SubscriptionTier::default(),
            session_token: None,
            avatar_url: "https://www.gravatar.com/avatar/x".into(),
            verified: false,
            verification_token: Some("tok".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn tier_parses_only_known_values() {
        assert_eq!("pro".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Pro);
        assert!("enterprise".parse::<SubscriptionTier>().is_err());
        assert!("Pro".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&SubscriptionTier::Business).unwrap();
        assert_eq!(json, "\"business\"");
    }

    #[test]
    fn pending_verification_requires_unverified() {
        let mut acct = account();
        let cond = Precondition::PendingVerification("tok".into());
        assert!(cond.holds(&acct));

        acct.verified = true;
        assert!(!cond.holds(&acct));
    }

    #[test]
    fn clearing_nullable_fields() {
        let mut acct = account();
        acct.session_token = Some("s".into());
        UpdateAccount {
            session_token: Some(None),
            verification_token: Some(None),
            verified: Some(true),
            ..Default::default()
        }
        .apply(&mut acct, Utc::now());

        assert!(acct.session_token.is_none());
        assert!(acct.verification_token.is_none());
        assert!(acct.verified);
    }
}
