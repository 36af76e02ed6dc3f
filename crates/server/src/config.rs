//! Server configuration

use std::env;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hoard_auth::password::HASH_LEN;

/// Service configuration loaded from environment variables. Auth key
/// material lives in [`hoard_auth::AuthConfig`]; this covers the rest.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// The single operator account.
    pub username: String,
    /// Salted credential hash, provisioned with the `hash-password` bin.
    pub password_hash: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:6844".to_string()),
            username: env::var("HOARD_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password_hash: {
                let encoded = env::var("HOARD_PASSWORD_HASH")
                    .map_err(|_| ConfigError::Missing("HOARD_PASSWORD_HASH"))?;
                let hash = URL_SAFE_NO_PAD
                    .decode(encoded.trim())
                    .map_err(|_| ConfigError::InvalidPasswordHash("not valid base64"))?;
                if hash.len() != HASH_LEN {
                    return Err(ConfigError::InvalidPasswordHash(
                        "decoded hash has the wrong length",
                    ));
                }
                hash
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid HOARD_PASSWORD_HASH: {0}")]
    InvalidPasswordHash(&'static str),
}
