//! Session carrier: the sealed envelope bound to a browser cookie
//!
//! The whole per-client state (token, pending flash messages, post-login
//! redirect target) travels as one sealed cookie value. Reading merges every
//! decode failure — absent cookie, tamper, corruption — into an empty
//! session; the authorizer never needs to distinguish them.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, TokenCodec};
use crate::config::AuthConfig;
use crate::token::AuthToken;

/// Everything the server remembers about a client, sealed into the cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AuthToken>,
    /// One-shot human-readable notices, drained when rendered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flash: Vec<String>,
    /// Where to send the client after the next successful login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,
}

impl SessionEnvelope {
    pub fn push_flash(&mut self, message: impl Into<String>) {
        self.flash.push(message.into());
    }

    /// Drain pending flash messages. The caller must persist the envelope
    /// afterwards so the messages stay one-shot.
    pub fn take_flash(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flash)
    }

    /// Consume the pending redirect target.
    pub fn take_redirect_target(&mut self) -> Option<String> {
        self.redirect_target.take()
    }
}

/// Cookie attributes for the session.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    /// Scope restricting which request paths receive the cookie.
    pub path: String,
    /// Cookie lifetime. Longer than the token lifetime so an expired token
    /// still comes back to us and earns a "session expired" flash.
    pub max_age_secs: i64,
    /// Send only over encrypted transport.
    pub secure_only: bool,
    /// Deliberately non-HttpOnly: the browser extension reads the cookie
    /// value to use it as its bearer token.
    pub script_accessible: bool,
}

impl CookieOptions {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            name: "hoard_auth".to_string(),
            path: config.prefixed("/"),
            max_age_secs: 60 * 60 * 24 * 60, // 60 days
            secure_only: config.secure_cookies,
            script_accessible: true,
        }
    }
}

/// Binds sealed envelopes to HTTP requests and responses.
#[derive(Clone)]
pub struct SessionCarrier {
    codec: TokenCodec,
    pub options: CookieOptions,
}

impl SessionCarrier {
    pub fn new(codec: TokenCodec, options: CookieOptions) -> Self {
        Self { codec, options }
    }

    /// Decode the session from request headers. Absent, tampered, or corrupt
    /// cookies all read as an empty session.
    pub fn read(&self, headers: &HeaderMap) -> SessionEnvelope {
        let Some(raw) = cookie_value(headers, &self.options.name) else {
            return SessionEnvelope::default();
        };
        match self.codec.open(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!(error = %err, "discarding undecodable session cookie");
                SessionEnvelope::default()
            }
        }
    }

    /// Seal the envelope into a `Set-Cookie` header value, replacing any
    /// previous session state on the client.
    pub fn write(&self, envelope: &SessionEnvelope) -> Result<String, CodecError> {
        let sealed = self.codec.seal(envelope)?;
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; SameSite=Lax",
            self.options.name, sealed, self.options.path, self.options.max_age_secs
        );
        if !self.options.script_accessible {
            cookie.push_str("; HttpOnly");
        }
        if self.options.secure_only {
            cookie.push_str("; Secure");
        }
        Ok(cookie)
    }
}

/// Extract a cookie value from a `Cookie` request header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if key == name {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn carrier() -> SessionCarrier {
        let codec = TokenCodec::new(&[3u8; 16], b"session-sign-key").expect("codec");
        SessionCarrier::new(
            codec,
            CookieOptions {
                name: "hoard_auth".to_string(),
                path: "/".to_string(),
                max_age_secs: 60,
                secure_only: false,
                script_accessible: true,
            },
        )
    }

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("other=1; hoard_auth={value}").parse().expect("header"),
        );
        headers
    }

    #[test]
    fn test_write_read_round_trip() {
        let carrier = carrier();
        let mut envelope = SessionEnvelope::default();
        envelope.push_flash("session expired");
        envelope.redirect_target = Some("/search?q=test".to_string());

        let cookie = carrier.write(&envelope).expect("write");
        let value = cookie
            .split_once('=')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(v, _)| v)
            .expect("cookie value");

        let read = carrier.read(&headers_with_cookie(value));
        assert_eq!(read, envelope);
    }

    #[test]
    fn test_cookie_attributes() {
        let carrier = carrier();
        let cookie = carrier.write(&SessionEnvelope::default()).expect("write");
        assert!(cookie.starts_with("hoard_auth="));
        assert!(cookie.contains("; Path=/"));
        assert!(cookie.contains("; Max-Age=60"));
        assert!(cookie.contains("; SameSite=Lax"));
        // Script-accessible on purpose; the extension reads this cookie.
        assert!(!cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_secure_and_http_only_attributes() {
        let mut carrier = carrier();
        carrier.options.secure_only = true;
        carrier.options.script_accessible = false;
        let cookie = carrier.write(&SessionEnvelope::default()).expect("write");
        assert!(cookie.contains("; HttpOnly"));
        assert!(cookie.contains("; Secure"));
    }

    #[test]
    fn test_absent_and_corrupt_cookies_read_as_empty() {
        let carrier = carrier();
        assert_eq!(carrier.read(&HeaderMap::new()), SessionEnvelope::default());
        assert_eq!(
            carrier.read(&headers_with_cookie("not-a-sealed-value")),
            SessionEnvelope::default()
        );

        // A valid sealed envelope with one byte flipped reads as empty too.
        let cookie = carrier
            .write(&SessionEnvelope {
                token: None,
                flash: vec!["hello".to_string()],
                redirect_target: None,
            })
            .expect("write");
        let value = cookie.split('=').nth(1).expect("value").split(';').next().expect("value");
        let mut tampered = value.to_string().into_bytes();
        tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).expect("ascii");
        assert_eq!(
            carrier.read(&headers_with_cookie(&tampered)),
            SessionEnvelope::default()
        );
    }

    #[test]
    fn test_flash_drains() {
        let mut envelope = SessionEnvelope::default();
        envelope.push_flash("one");
        envelope.push_flash("two");
        assert_eq!(envelope.take_flash(), vec!["one", "two"]);
        assert!(envelope.take_flash().is_empty());
    }
}
