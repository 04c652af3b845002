//! Server configuration, read from `WARDEN_*` environment variables.
//!
//! A `.env` file in the working directory is loaded first if present.
//! Only `WARDEN_JWT_SECRET` is required; everything else has a default.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use warden_auth::AuthConfig;
use warden_avatar::AvatarConfig;
use warden_db::DbConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Outbound mail settings. Without an API key, mail is only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sendgrid_api_key: Option<String>,
    pub from: String,
    /// Capacity of the notification queue.
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            from: "no-reply@localhost".into(),
            queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub avatar: AvatarConfig,
    pub db: DbConfig,
    pub mail: MailConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("WARDEN_JWT_SECRET").ok_or(ConfigError::Missing("WARDEN_JWT_SECRET"))?;

        let mut auth = AuthConfig {
            jwt_secret,
            pepper: get("WARDEN_PEPPER"),
            ..AuthConfig::default()
        };
        if let Some(url) = get("WARDEN_PUBLIC_URL") {
            auth.public_base_url = url;
        }

        let mut avatar = AvatarConfig::default();
        if let Some(dir) = get("WARDEN_STAGING_DIR") {
            avatar.staging_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("WARDEN_AVATAR_DIR") {
            avatar.public_dir = PathBuf::from(dir);
        }
        if let Some(size) = parse(&get, "WARDEN_AVATAR_SIZE")? {
            avatar.dimension = size;
        }

        let defaults = DbConfig::default();
        let db = DbConfig {
            url: get("WARDEN_DB_URL").unwrap_or(defaults.url),
            namespace: get("WARDEN_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: get("WARDEN_DB_DATABASE").unwrap_or(defaults.database),
            username: get("WARDEN_DB_USER"),
            password: get("WARDEN_DB_PASS"),
        };

        let mut mail = MailConfig {
            sendgrid_api_key: get("WARDEN_SENDGRID_API_KEY"),
            ..MailConfig::default()
        };
        if let Some(from) = get("WARDEN_MAIL_FROM") {
            mail.from = from;
        }
        if let Some(capacity) = parse(&get, "WARDEN_NOTIFY_QUEUE")? {
            mail.queue_capacity = capacity;
        }

        Ok(Self {
            host: get("WARDEN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&get, "WARDEN_PORT")?.unwrap_or(3000),
            auth,
            avatar,
            db,
            mail,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("WARDEN_JWT_SECRET"))
        ));
        assert!(matches!(
            config(&[("WARDEN_JWT_SECRET", "  ")]),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("WARDEN_JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.db.url, "mem://");
        assert_eq!(cfg.avatar.dimension, 250);
        assert_eq!(cfg.auth.session_token_lifetime_secs, 3600);
        assert!(cfg.mail.sendgrid_api_key.is_none());
    }

    #[test]
    fn overrides_apply() {
        let cfg = config(&[
            ("WARDEN_JWT_SECRET", "s"),
            ("WARDEN_PORT", "8081"),
            ("WARDEN_PUBLIC_URL", "https://id.example.com"),
            ("WARDEN_DB_URL", "ws://db:8000"),
            ("WARDEN_DB_USER", "root"),
            ("WARDEN_AVATAR_DIR", "/srv/avatars"),
            ("WARDEN_AVATAR_SIZE", "128"),
            ("WARDEN_NOTIFY_QUEUE", "8"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.auth.public_base_url, "https://id.example.com");
        assert_eq!(cfg.db.url, "ws://db:8000");
        assert_eq!(cfg.db.username.as_deref(), Some("root"));
        assert!(cfg.db.password.is_none());
        assert_eq!(cfg.avatar.public_dir, PathBuf::from("/srv/avatars"));
        assert_eq!(cfg.avatar.dimension, 128);
        assert_eq!(cfg.mail.queue_capacity, 8);
    }

    #[test]
    fn unparseable_numbers_are_errors() {
        let err = config(&[("WARDEN_JWT_SECRET", "s"), ("WARDEN_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WARDEN_PORT", .. }));
    }
}
