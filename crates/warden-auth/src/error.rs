//! Authentication error types.

use thiserror::Error;
use warden_core::error::WardenError;

/// Message shared by every login rejection so callers cannot tell an
/// unknown email from a wrong password.
pub const INVALID_CREDENTIALS: &str = "Email or password is wrong";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("session is no longer active")]
    SessionRevoked,

    #[error("{0}")]
    PasswordPolicy(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for WardenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => WardenError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) | AuthError::SessionRevoked => {
                WardenError::AuthenticationFailed {
                    reason: "Not authorized: invalid or expired token".into(),
                }
            }
            AuthError::PasswordPolicy(message) => WardenError::Validation { message },
            AuthError::Crypto(msg) => WardenError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_uses_shared_message() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), INVALID_CREDENTIALS);
        let err: WardenError = AuthError::InvalidCredentials.into();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn token_failures_share_one_reason() {
        let expired: WardenError = AuthError::TokenExpired.into();
        let revoked: WardenError = AuthError::SessionRevoked.into();
        assert_eq!(expired.to_string(), revoked.to_string());
    }
}
