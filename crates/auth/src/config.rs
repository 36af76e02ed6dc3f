//! Auth configuration: key material and cookie scope
//!
//! All key material is loaded once at startup into an immutable value that is
//! passed by reference into every component that needs it. Missing or
//! malformed values abort startup rather than degrade into an instance that
//! silently mints unverifiable tokens.

use std::env;

/// Immutable key material and path scope for the auth subsystem.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide salt for the credential hasher.
    pub salt: Vec<u8>,
    /// AES key; 16, 24, or 32 bytes selects AES-128/192/256.
    pub encrypt_key: Vec<u8>,
    /// HMAC signing key, independent of the encryption key.
    pub sign_key: Vec<u8>,
    /// Static long-lived service credentials for the bearer channel.
    pub api_keys: Vec<String>,
    /// Path scope the service is mounted under behind the reverse proxy.
    pub path_prefix: String,
    /// Send the session cookie only over encrypted transport.
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Validate and assemble a configuration from raw parts.
    pub fn new(
        salt: Vec<u8>,
        encrypt_key: Vec<u8>,
        sign_key: Vec<u8>,
        api_keys: Vec<String>,
        path_prefix: String,
        secure_cookies: bool,
    ) -> Result<Self, ConfigError> {
        if salt.is_empty() {
            return Err(ConfigError::EmptySalt);
        }
        if !matches!(encrypt_key.len(), 16 | 24 | 32) {
            return Err(ConfigError::EncryptKeyLength(encrypt_key.len()));
        }
        if sign_key.is_empty() {
            return Err(ConfigError::EmptySignKey);
        }
        if !path_prefix.is_empty() && !path_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(
                "path prefix must start with '/'",
            ));
        }
        Ok(Self {
            salt,
            encrypt_key,
            sign_key,
            api_keys,
            path_prefix,
            secure_cookies,
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let salt = env::var("HOARD_AUTH_SALT")
            .map_err(|_| ConfigError::Missing("HOARD_AUTH_SALT"))?
            .into_bytes();
        let encrypt_key = env::var("HOARD_ENCRYPT_KEY")
            .map_err(|_| ConfigError::Missing("HOARD_ENCRYPT_KEY"))?
            .into_bytes();
        let sign_key = env::var("HOARD_SIGN_KEY")
            .map_err(|_| ConfigError::Missing("HOARD_SIGN_KEY"))?
            .into_bytes();
        let api_keys = env::var("HOARD_API_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        let path_prefix = env::var("HOARD_PATH_PREFIX").unwrap_or_default();
        let secure_cookies = env::var("HOARD_SECURE_COOKIES")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Self::new(
            salt,
            encrypt_key,
            sign_key,
            api_keys,
            path_prefix,
            secure_cookies,
        )
    }

    /// Resolve a service path against the configured prefix.
    ///
    /// Every redirect and cookie-scope decision goes through here; no call
    /// site applies the prefix on its own. A path that already carries the
    /// prefix passes through unchanged.
    pub fn prefixed(&self, path: &str) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            if path.starts_with('/') {
                return path.to_string();
            }
            return format!("/{path}");
        }
        if !path.starts_with('/') {
            return format!("{prefix}/{path}");
        }
        if path == prefix || path.starts_with(&format!("{prefix}/")) {
            return path.to_string();
        }
        format!("{prefix}{path}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Auth salt must not be empty")]
    EmptySalt,
    #[error("Encryption key must be 16, 24, or 32 bytes, got {0}")]
    EncryptKeyLength(usize),
    #[error("Signing key must not be empty")]
    EmptySignKey,
    #[error("Invalid path prefix: {0}")]
    InvalidPrefix(&'static str),
}
