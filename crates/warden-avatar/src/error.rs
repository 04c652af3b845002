//! Avatar pipeline error types.

use thiserror::Error;
use warden_core::error::WardenError;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("{0}")]
    InvalidImage(String),

    #[error("avatar storage failure: {0}")]
    Io(String),
}

impl From<AvatarError> for WardenError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::InvalidImage(message) => WardenError::Validation { message },
            AvatarError::Io(msg) => WardenError::Io(msg),
        }
    }
}
