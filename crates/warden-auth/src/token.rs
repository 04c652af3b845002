//! Session token issuance/validation (HS256 JWT) and opaque
//! verification token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — account ID (UUID string).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID, so two logins in the same second differ.
    pub jti: String,
}

impl SessionClaims {
    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

/// Signs and checks bearer session tokens.
///
/// Signature and expiry checks are stateless; whether the token is
/// still the account's current session is decided by
/// [`SessionValidator`](crate::session::SessionValidator).
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    lifetime_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Crypto("JWT secret must not be empty".into()));
        }
        let lifetime_secs = i64::try_from(config.session_token_lifetime_secs)
            .map_err(|_| AuthError::Crypto("session token lifetime out of range".into()))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            lifetime_secs,
        })
    }

    /// Issue a signed token for `account_id` expiring after the configured TTL.
    pub fn issue(&self, account_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.lifetime_secs,
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify signature, issuer and expiry, returning the embedded claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }
}

/// Generate a cryptographically random opaque token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_opaque_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-do-not-use".into(),
            jwt_issuer: "warden-test".into(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let account_id = Uuid::new_v4();

        let token = issuer.issue(account_id).unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims.account_id().unwrap(), account_id);
        assert_eq!(claims.iss, "warden-test");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn jti_is_unique() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let id = Uuid::new_v4();
        assert_ne!(issuer.issue(id).unwrap(), issuer.issue(id).unwrap());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let forger = TokenIssuer::new(&AuthConfig {
            jwt_secret: "someone-else".into(),
            ..test_config()
        })
        .unwrap();

        let forged = forger.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(issuer.validate(&forged), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let token = issuer.issue(Uuid::new_v4()).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let other = issuer.issue(Uuid::new_v4()).unwrap();
        let other_payload = other.split('.').nth(1).unwrap().to_string();
        parts[1] = &other_payload;
        let spliced = parts.join(".");

        assert!(issuer.validate(&spliced).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config).unwrap();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            iss: config.jwt_issuer.clone(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(issuer.validate(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(TokenIssuer::new(&AuthConfig::default()).is_err());
    }

    #[test]
    fn opaque_token_is_url_safe() {
        let token = generate_opaque_token();
        // base64url characters only (A-Z a-z 0-9 - _), no padding.
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_opaque_token());
    }
}
