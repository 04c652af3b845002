//! Warden Server — axum HTTP surface, configuration and mail delivery
//! for the account service.

pub mod api;
pub mod config;
pub mod error;
pub mod mail;
pub mod validation;

pub use api::{AppState, create_router};
pub use config::{ConfigError, MailConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use mail::{LogGateway, MailGateway, SendGridGateway};
