//! The credential-verification capability for a single-operator archive.

use hoard_auth::password::{constant_time_eq, CredentialError, CredentialStore};

/// Exactly one account, configured at startup. The stored value is the
/// salted hash; no plaintext password exists on the server side.
pub struct SingleUserStore {
    username: String,
    password_hash: Vec<u8>,
}

impl SingleUserStore {
    pub fn new(username: String, password_hash: Vec<u8>) -> Self {
        Self {
            username,
            password_hash,
        }
    }
}

impl CredentialStore for SingleUserStore {
    fn validate(&self, username: &str, password_hash: &[u8]) -> Result<(), CredentialError> {
        if username != self.username {
            return Err(CredentialError::UnknownUser);
        }
        if !constant_time_eq(password_hash, &self.password_hash) {
            return Err(CredentialError::HashMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let store = SingleUserStore::new("admin".to_string(), vec![7u8; 32]);
        assert!(store.validate("admin", &[7u8; 32]).is_ok());
        assert!(matches!(
            store.validate("root", &[7u8; 32]),
            Err(CredentialError::UnknownUser)
        ));
        assert!(matches!(
            store.validate("admin", &[0u8; 32]),
            Err(CredentialError::HashMismatch)
        ));
    }
}
