//! Credential hashing and the credential-verification boundary
//!
//! Plaintext passwords never cross [`CredentialStore::validate`]; only the
//! salted hash produced here does. The hash is deterministic for a given
//! password and salt so it can be stored in a token at issuance time and
//! compared again on every request.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Fixed output length of the credential hash.
pub const HASH_LEN: usize = 32;

/// Fixed PBKDF2-HMAC-SHA256 iteration count. Changing this invalidates every
/// stored hash and every outstanding token.
const PBKDF2_ROUNDS: u32 = 100_000;

/// Derive the comparable credential hash for a password.
pub fn salt_and_hash(salt: &[u8], password: &str) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut out);
    out
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        // Do a dummy comparison to avoid length-based timing attacks
        let dummy = vec![0u8; a.len()];
        let _ = a.ct_eq(&dummy);
        return false;
    }
    a.ct_eq(b).into()
}

/// The external credential-verification capability.
///
/// Implementations must be safe to call with attacker-controlled usernames.
pub trait CredentialStore: Send + Sync {
    /// Check that the hash is the current credential for the user.
    fn validate(&self, username: &str, password_hash: &[u8]) -> Result<(), CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("unknown user")]
    UnknownUser,
    #[error("password hash does not match")]
    HashMismatch,
}
