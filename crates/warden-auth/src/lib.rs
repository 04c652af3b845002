//! Warden Auth — password hashing, session token issuance/validation,
//! email verification and the account service composing them.

pub mod config;
pub mod error;
pub mod notify;
pub mod password;
pub mod service;
pub mod session;
pub mod token;
pub mod verification;

pub use config::AuthConfig;
pub use error::AuthError;
pub use notify::NotificationDispatcher;
pub use password::CredentialHasher;
pub use service::{AccountService, LoginInput, LoginOutput, RegisterInput};
pub use session::SessionValidator;
pub use token::{SessionClaims, TokenIssuer};
pub use verification::VerificationTokenManager;
