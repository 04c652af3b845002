//! Outbound notification contract.
//!
//! The core only builds message content; delivery belongs to a
//! [`NotificationGateway`] implementation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl Notification {
    /// Email asking the recipient to confirm ownership of `to`.
    pub fn verification(to: &str, public_base_url: &str, token: &str) -> Self {
        let base = public_base_url.trim_end_matches('/');
        Self {
            to: to.to_string(),
            subject: "Verify your email".into(),
            html_body: format!(
                "<a target=\"_blank\" href=\"{base}/api/users/verify/{token}\">\
                 Click here to verify your email</a>"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by provider: {status} {body}")]
    Rejected { status: u16, body: String },
}

pub trait NotificationGateway: Send + Sync + 'static {
    fn send(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_link_embeds_token() {
        let n = Notification::verification("a@x.com", "http://localhost:3000/", "abc_123");
        assert_eq!(n.to, "a@x.com");
        assert!(
            n.html_body
                .contains("http://localhost:3000/api/users/verify/abc_123")
        );
    }
}
