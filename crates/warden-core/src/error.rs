//! Error types for the warden account service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{reason}")]
    AuthenticationFailed { reason: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{entity} not found")]
    NotFound { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::AuthenticationFailed { .. } => "unauthorized",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Database(_) | Self::Io(_) | Self::Crypto(_) | Self::Internal(_) => {
                "internal_error"
            }
        }
    }
}

pub type WardenResult<T> = Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_hides_id() {
        let err = WardenError::not_found("Account", "verification_token=secret");
        assert_eq!(err.to_string(), "Account not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn storage_failures_share_a_kind() {
        assert_eq!(WardenError::Database("x".into()).kind(), "internal_error");
        assert_eq!(WardenError::Io("x".into()).kind(), "internal_error");
    }
}
