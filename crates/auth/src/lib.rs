//! Authorization core for the hoard page archive.
//!
//! Everything a request needs to prove it belongs to the operator lives in
//! this crate: the credential hasher, the sealed-token codec, the cookie
//! session carrier, the bearer channel for the browser extension, and the
//! authorizer middleware that ties them together. Storage and rendering are
//! someone else's problem; the only outside contract is [`CredentialStore`].

pub mod bearer;
pub mod codec;
pub mod config;
pub mod login;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

pub use bearer::BearerChannel;
pub use codec::{CodecError, TokenCodec};
pub use config::{AuthConfig, ConfigError};
pub use middleware::{require_auth, AuthState, Identity};
pub use password::{constant_time_eq, salt_and_hash, CredentialError, CredentialStore};
pub use session::{CookieOptions, SessionCarrier, SessionEnvelope};
pub use token::{AuthError, AuthToken, TokenManager};
