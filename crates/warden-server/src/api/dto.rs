//! Request and response bodies.
//!
//! Request fields are optional at the serde level so that a missing
//! field surfaces as a validation message rather than a parse error.

use serde::{Deserialize, Serialize};
use warden_core::models::account::{Account, SubscriptionTier};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionRequest {
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub name: String,
    pub subscription: SubscriptionTier,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: RegisteredUser,
}

impl From<Account> for RegisterResponse {
    fn from(account: Account) -> Self {
        Self {
            user: RegisteredUser {
                email: account.email,
                name: account.name,
                subscription: account.subscription,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub subscription: SubscriptionTier,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub email: String,
    pub name: String,
    pub subscription: SubscriptionTier,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    pub verified: bool,
}

impl From<Account> for CurrentUserResponse {
    fn from(account: Account) -> Self {
        Self {
            email: account.email,
            name: account.name,
            subscription: account.subscription,
            avatar_url: account.avatar_url,
            verified: account.verified,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub email: String,
    pub subscription: SubscriptionTier,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
