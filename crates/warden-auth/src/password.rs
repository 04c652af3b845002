//! Password hashing and verification using Argon2id.
//!
//! Digests are PHC strings, so the salt and work factor travel with the
//! hash and need no separate storage.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// One-way salted password hasher with a fixed work factor.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    pepper: Option<String>,
    max_length: usize,
}

impl CredentialHasher {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;

        Ok(Self {
            params,
            pepper: config.pepper.clone(),
            max_length: config.max_password_length,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn peppered(&self, password: &str) -> String {
        match self.pepper.as_deref() {
            Some(p) => format!("{p}{password}"),
            None => password.to_string(),
        }
    }

    /// Hash a plaintext password into a PHC-format Argon2id digest.
    ///
    /// Rejects empty input and input longer than the configured maximum.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::PasswordPolicy("password must not be empty".into()));
        }
        if password.chars().count() > self.max_length {
            return Err(AuthError::PasswordPolicy(format!(
                "password must be at most {} characters",
                self.max_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(self.peppered(password).as_bytes(), &salt)
            .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// Returns `Ok(false)` on mismatch, or `Err(AuthError::Crypto)` if the
    /// stored hash is malformed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

        // Parameters are read from the digest itself.
        match Argon2::default().verify_password(self.peppered(password).as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the suite stays fast.
    fn hasher(pepper: Option<&str>) -> CredentialHasher {
        CredentialHasher::new(&AuthConfig {
            pepper: pepper.map(Into::into),
            hash_memory_kib: 1024,
            hash_iterations: 1,
            ..AuthConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn correct_password_matches() {
        let h = hasher(None);
        let hash = h.hash("hunter2").unwrap();
        assert!(h.verify("hunter2", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let h = hasher(None);
        let hash = h.hash("hunter2").unwrap();
        assert!(!h.verify("hunter3", &hash).unwrap());
        assert!(!h.verify("", &hash).unwrap());
    }

    #[test]
    fn digest_is_salted_argon2id() {
        let h = hasher(None);
        let a = h.hash("secret1").unwrap();
        let b = h.hash("secret1").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(!a.contains("secret1"));
    }

    #[test]
    fn pepper_is_applied() {
        let peppered = hasher(Some("pepper!"));
        let hash = peppered.hash("hunter2").unwrap();
        assert!(peppered.verify("hunter2", &hash).unwrap());
        // Without pepper should fail.
        assert!(!hasher(None).verify("hunter2", &hash).unwrap());
    }

    #[test]
    fn empty_and_oversized_passwords_are_rejected() {
        let h = hasher(None);
        assert!(matches!(h.hash(""), Err(AuthError::PasswordPolicy(_))));

        let long = "x".repeat(AuthConfig::default().max_password_length + 1);
        assert!(matches!(h.hash(&long), Err(AuthError::PasswordPolicy(_))));
    }

    #[test]
    fn malformed_hash_returns_error() {
        let result = hasher(None).verify("pw", "not-a-hash");
        assert!(result.is_err());
    }
}
