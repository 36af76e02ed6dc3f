//! Authorizer middleware
//!
//! One decision point for every protected handler: try the session cookie,
//! fall back to the bearer channel, and either forward the request with an
//! [`Identity`] extension or redirect to the login page with a flash note.
//! Both paths share the exact same token validity logic.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue, Method, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::bearer::BearerChannel;
use crate::codec::{CodecError, TokenCodec};
use crate::config::AuthConfig;
use crate::password::CredentialStore;
use crate::session::{CookieOptions, SessionCarrier, SessionEnvelope};
use crate::token::TokenManager;

/// Upper bound when buffering a body for bearer inspection. Matches the
/// route-level body limit so the bearer path never rejects a request the
/// handler would have accepted.
const MAX_BEARER_BODY_BYTES: usize = 10 * 1024 * 1024;

/// What the client sees when a request fails both auth paths. The real
/// reason stays in the server logs.
const LOGIN_FLASH: &str = "Please log in to continue.";

/// Who a request was authorized as; inserted as a request extension.
#[derive(Debug, Clone)]
pub enum Identity {
    /// A cookie session or sealed bearer token for the operator.
    User { username: String },
    /// A static configured API key; a service credential, not a session.
    ApiKey,
}

/// Shared, immutable auth plumbing handed to middleware and login handlers.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub carrier: SessionCarrier,
    pub bearer: BearerChannel,
    pub manager: TokenManager,
}

impl AuthState {
    pub fn new(
        config: Arc<AuthConfig>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CodecError> {
        let codec = TokenCodec::new(&config.encrypt_key, &config.sign_key)?;
        let carrier = SessionCarrier::new(codec.clone(), CookieOptions::from_config(&config));
        let bearer = BearerChannel::new(config.api_keys.clone(), codec);
        let manager = TokenManager::new(store);
        Ok(Self {
            config,
            carrier,
            bearer,
            manager,
        })
    }

    pub fn login_path(&self) -> String {
        self.config.prefixed("/login")
    }

    pub fn root_path(&self) -> String {
        self.config.prefixed("/")
    }
}

/// Gate a handler behind authentication.
///
/// Layer with `middleware::from_fn_with_state(auth_state, require_auth)`.
pub async fn require_auth(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    // First path: the session cookie. Needs headers only.
    let mut envelope = auth.carrier.read(&parts.headers);
    if let Some(token) = envelope.token.take() {
        match auth.manager.validate(&token) {
            Ok(()) => {
                let username = token.username.clone();
                envelope.token = Some(token);
                let refreshed = refreshed_cookie(&auth, &parts.method, &mut envelope);
                parts.extensions.insert(Identity::User { username });

                let mut response = next.run(Request::from_parts(parts, body)).await;
                if let Some(cookie) = refreshed {
                    append_set_cookie(&mut response, &cookie);
                }
                return response;
            }
            Err(err) => {
                tracing::info!(error = %err, "session cookie rejected, trying bearer channel");
            }
        }
    }

    // Second path: bearer token in the body. Buffer the bytes so the
    // protected handler still sees the original payload afterwards.
    let bytes = match to_bytes(body, MAX_BEARER_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer request body for bearer auth");
            return deny(&auth, &parts.uri);
        }
    };

    match auth.bearer.authorize(&bytes, &auth.manager) {
        Ok(identity) => {
            parts.extensions.insert(identity);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => {
            tracing::info!(error = %err, path = %parts.uri.path(), "request failed both auth paths");
            deny(&auth, &parts.uri)
        }
    }
}

/// Sliding expiration: re-issue the session token on safe navigation
/// methods. State-changing submissions keep the token they arrived with.
/// Refresh failures are logged and the request proceeds unrefreshed.
fn refreshed_cookie(
    auth: &AuthState,
    method: &Method,
    envelope: &mut SessionEnvelope,
) -> Option<String> {
    if !matches!(*method, Method::GET | Method::HEAD) {
        return None;
    }
    let token = envelope.token.as_ref()?;
    match auth.manager.refresh(token) {
        Ok(fresh) => envelope.token = Some(fresh),
        Err(err) => {
            tracing::warn!(error = %err, "token refresh failed; continuing with original token");
            return None;
        }
    }
    match auth.carrier.write(envelope) {
        Ok(cookie) => Some(cookie),
        Err(err) => {
            tracing::warn!(error = %err, "failed to seal refreshed session");
            None
        }
    }
}

/// Terminal unauthorized: remember where the client was going in a fresh
/// session, flash a generic note, and send them to the login page.
fn deny(auth: &AuthState, uri: &Uri) -> Response {
    let mut fresh = SessionEnvelope::default();
    fresh.push_flash(LOGIN_FLASH);
    fresh.redirect_target = Some(
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
    );

    let login = auth.login_path();
    match auth.carrier.write(&fresh) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to(&login)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to seal login-redirect session");
            Redirect::to(&login).into_response()
        }
    }
}

fn append_set_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => {
            tracing::warn!(error = %err, "refreshed session cookie is not a valid header value");
        }
    }
}
