//! Bearer channel: token presentation for non-cookie clients
//!
//! The browser extension and other scripts cannot rely on cookie plumbing, so
//! they carry a `"token"` field in the JSON request body. The value is either
//! a static configured API key (a long-lived service credential that bypasses
//! expiry and signature checks entirely) or the same sealed session envelope
//! a cookie would hold.

use serde::Deserialize;

use crate::codec::TokenCodec;
use crate::middleware::Identity;
use crate::password::constant_time_eq;
use crate::session::SessionEnvelope;
use crate::token::{AuthError, TokenManager};

/// The recognized part of a bearer request body. Clients send their payload
/// fields alongside `token`; everything else is ignored here and consumed by
/// the protected handler after the body is restored.
#[derive(Debug, Deserialize)]
struct BearerBody {
    token: String,
}

#[derive(Clone)]
pub struct BearerChannel {
    api_keys: Vec<String>,
    codec: TokenCodec,
}

impl BearerChannel {
    pub fn new(api_keys: Vec<String>, codec: TokenCodec) -> Self {
        Self { api_keys, codec }
    }

    /// Authorize a buffered request body.
    ///
    /// API keys are checked first and unconditionally; anything else must
    /// decode as a sealed envelope whose token passes the same validity
    /// checks as a cookie session.
    pub fn authorize(&self, body: &[u8], manager: &TokenManager) -> Result<Identity, AuthError> {
        let parsed: BearerBody =
            serde_json::from_slice(body).map_err(|_| AuthError::Missing)?;

        if self.is_api_key(&parsed.token) {
            return Ok(Identity::ApiKey);
        }

        let mut envelope: SessionEnvelope = self.codec.open(&parsed.token)?;
        let token = envelope.token.take().ok_or(AuthError::Missing)?;
        manager.validate(&token)?;
        Ok(Identity::User {
            username: token.username,
        })
    }

    fn is_api_key(&self, candidate: &str) -> bool {
        // Compare against every key regardless of an early match.
        let mut matched = false;
        for key in &self.api_keys {
            matched |= constant_time_eq(candidate.as_bytes(), key.as_bytes());
        }
        matched
    }
}
