//! [`NotificationGateway`] implementations.

use std::time::Duration;

use serde_json::json;
use tracing::info;
use warden_core::notification::{Notification, NotificationError, NotificationGateway};

use crate::config::MailConfig;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Delivers mail through the SendGrid v3 HTTP API.
pub struct SendGridGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl SendGridGateway {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: SENDGRID_ENDPOINT.to_string(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }

    fn payload(&self, notification: &Notification) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": notification.to }] }],
            "from": { "email": self.from },
            "subject": notification.subject,
            "content": [{ "type": "text/html", "value": notification.html_body }],
        })
    }
}

impl NotificationGateway for SendGridGateway {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(&notification))
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Logs recipient and subject instead of sending. Used when no mail
/// provider is configured.
pub struct LogGateway;

impl NotificationGateway for LogGateway {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Mail delivery disabled, notification logged only"
        );
        Ok(())
    }
}

/// Whichever gateway the configuration selects.
pub enum MailGateway {
    SendGrid(SendGridGateway),
    Log(LogGateway),
}

impl MailGateway {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        match &config.sendgrid_api_key {
            Some(key) => Ok(Self::SendGrid(SendGridGateway::new(key.clone(), config.from.clone())?)),
            None => Ok(Self::Log(LogGateway)),
        }
    }
}

impl NotificationGateway for MailGateway {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        match self {
            Self::SendGrid(gateway) => gateway.send(notification).await,
            Self::Log(gateway) => gateway.send(notification).await,
        }
    }
}
