//! Auth tokens: issuance, validation, refresh
//!
//! A token is a self-contained claim of identity; no server-side store backs
//! it. It is valid while the embedded credential hash still verifies against
//! the [`CredentialStore`] and the issuance time is within the lifetime, so a
//! password change invalidates every outstanding token at once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::codec::CodecError;
use crate::password::{CredentialError, CredentialStore};

/// Lifetime of a token from its issuance.
pub const TOKEN_TTL: Duration = Duration::days(30);

/// The payload sealed into every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Subject identity.
    pub username: String,
    /// Credential hash at issuance time, re-verified on every request.
    pub password_hash: Vec<u8>,
    /// Unix timestamp of issuance; drives expiry and sliding refresh.
    pub issued_at: i64,
}

impl AuthToken {
    /// Age of the token relative to the current clock.
    pub fn age(&self) -> Duration {
        OffsetDateTime::now_utc()
            - OffsetDateTime::from_unix_timestamp(self.issued_at)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// Issues and validates tokens against the credential capability.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Issue a token for a credential hash the store accepts.
    pub fn issue(&self, username: &str, password_hash: &[u8]) -> Result<AuthToken, AuthError> {
        self.store.validate(username, password_hash)?;
        Ok(AuthToken {
            username: username.to_string(),
            password_hash: password_hash.to_vec(),
            issued_at: OffsetDateTime::now_utc().unix_timestamp(),
        })
    }

    /// Check that the token carries current credentials and is unexpired.
    pub fn validate(&self, token: &AuthToken) -> Result<(), AuthError> {
        self.store.validate(&token.username, &token.password_hash)?;
        if token.age() >= TOKEN_TTL {
            return Err(AuthError::Expired);
        }
        Ok(())
    }

    /// Re-issue a valid token with a fresh issuance time. The input token is
    /// untouched and its encoded form stays independently valid until its
    /// own expiry.
    pub fn refresh(&self, token: &AuthToken) -> Result<AuthToken, AuthError> {
        self.validate(token)?;
        self.issue(&token.username, &token.password_hash)
    }
}

/// Per-request authorization failures. Every variant collapses into the same
/// unauthorized outcome for the client; the distinction exists for
/// server-side logs only.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token has expired")]
    Expired,
    #[error("credentials no longer valid: {0}")]
    CredentialMismatch(#[from] CredentialError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("failed to read request body")]
    Transport,
    #[error("no credentials presented")]
    Missing,
}
