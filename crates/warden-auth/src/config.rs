//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens. Never embedded in a token.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Session token lifetime in seconds (default: 3600 = 1 hour).
    pub session_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Longest password the hasher accepts.
    pub max_password_length: usize,
    /// Argon2id memory cost in KiB (OWASP: 19456).
    pub hash_memory_kib: u32,
    /// Argon2id iteration count.
    pub hash_iterations: u32,
    /// Argon2id lane count.
    pub hash_parallelism: u32,
    /// Externally reachable base URL, used to build verification links.
    pub public_base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "warden".into(),
            session_token_lifetime_secs: 3600,
            pepper: None,
            min_password_length: 6,
            max_password_length: 128,
            hash_memory_kib: 19456,
            hash_iterations: 2,
            hash_parallelism: 1,
            public_base_url: "http://localhost:3000".into(),
        }
    }
}
