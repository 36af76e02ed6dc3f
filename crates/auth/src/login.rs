//! Login flow: the unauthenticated entry point
//!
//! `GET /login` renders a minimal credential form and surfaces any pending
//! flash messages; `POST /login` verifies the submitted credentials through
//! the hasher and the credential store, issues a fresh token, and sends the
//! client back to wherever the authorizer interrupted them.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::middleware::AuthState;
use crate::password::salt_and_hash;
use crate::session::SessionEnvelope;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Render the login form, draining pending flash messages.
pub async fn get_login(State(auth): State<AuthState>, headers: HeaderMap) -> Response {
    let mut envelope = auth.carrier.read(&headers);
    let flashes = envelope.take_flash();
    let page = render_login_page(&auth.login_path(), &flashes);

    // Persist the drained envelope so the flashes stay one-shot.
    match auth.carrier.write(&envelope) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Html(page)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to re-seal session after draining flashes");
            Html(page).into_response()
        }
    }
}

/// Verify submitted credentials and start a session.
pub async fn post_login(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut envelope = auth.carrier.read(&headers);
    let password_hash = salt_and_hash(&auth.config.salt, &form.password);

    match auth.manager.issue(&form.username, &password_hash) {
        Ok(token) => {
            let destination = envelope
                .take_redirect_target()
                .map(|target| auth.config.prefixed(&target))
                .unwrap_or_else(|| auth.root_path());
            envelope.token = Some(token);
            respond_with_session(&auth, &envelope, &destination)
        }
        Err(err) => {
            // The concrete reason stays server-side.
            tracing::info!(username = %form.username, error = %err, "login attempt rejected");
            let mut fresh = SessionEnvelope {
                redirect_target: envelope.take_redirect_target(),
                ..SessionEnvelope::default()
            };
            fresh.push_flash("Login failed. Check your username and password.");
            respond_with_session(&auth, &fresh, &auth.login_path())
        }
    }
}

fn respond_with_session(auth: &AuthState, envelope: &SessionEnvelope, destination: &str) -> Response {
    match auth.carrier.write(envelope) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to(destination)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to seal session");
            Redirect::to(destination).into_response()
        }
    }
}

fn render_login_page(action: &str, flashes: &[String]) -> String {
    let mut notices = String::new();
    for flash in flashes {
        notices.push_str("<p class=\"flash\">");
        notices.push_str(&escape_html(flash));
        notices.push_str("</p>\n");
    }
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>hoard — log in</title></head>\n<body>\n{notices}<form method=\"post\" action=\"{action}\">\n<label>Username <input type=\"text\" name=\"username\" autofocus></label>\n<label>Password <input type=\"password\" name=\"password\"></label>\n<button type=\"submit\">Log in</button>\n</form>\n</body>\n</html>\n",
        action = escape_html(action),
    )
}

/// Minimal HTML escaping for user-visible text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AuthConfig;
    use crate::password::{constant_time_eq, CredentialError, CredentialStore};
    use crate::token::AuthToken;
    use axum::body::{to_bytes, Body};
    use axum::extract::Request;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    const SALT: &[u8] = b"login-test-salt";

    /// Store holding the hash of "hunter2" for user "spencer".
    struct PasswordStore {
        password_hash: Vec<u8>,
    }

    impl CredentialStore for PasswordStore {
        fn validate(&self, username: &str, password_hash: &[u8]) -> Result<(), CredentialError> {
            if username != "spencer" {
                return Err(CredentialError::UnknownUser);
            }
            if !constant_time_eq(password_hash, &self.password_hash) {
                return Err(CredentialError::HashMismatch);
            }
            Ok(())
        }
    }

    fn auth_state() -> AuthState {
        let config = Arc::new(
            AuthConfig::new(
                SALT.to_vec(),
                vec![6u8; 16],
                b"login-sign-key".to_vec(),
                vec![],
                String::new(),
                false,
            )
            .expect("config"),
        );
        let store = Arc::new(PasswordStore {
            password_hash: salt_and_hash(SALT, "hunter2").to_vec(),
        });
        AuthState::new(config, store).expect("auth state")
    }

    fn app(auth: &AuthState) -> Router {
        Router::new()
            .route("/login", get(get_login).post(post_login))
            .with_state(auth.clone())
    }

    fn cookie_pair(auth: &AuthState, envelope: &SessionEnvelope) -> String {
        auth.carrier
            .write(envelope)
            .expect("cookie")
            .split_once(';')
            .map(|(pair, _)| pair.to_string())
            .expect("pair")
    }

    fn read_set_cookie(auth: &AuthState, response: &axum::response::Response) -> SessionEnvelope {
        let set_cookie = response.headers()[SET_COOKIE].to_str().expect("cookie");
        let value = set_cookie
            .split_once('=')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(v, _)| v)
            .expect("value");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("hoard_auth={value}").parse().expect("header"));
        auth.carrier.read(&headers)
    }

    #[tokio::test]
    async fn test_get_login_renders_and_drains_flashes() {
        let auth = auth_state();
        let mut envelope = SessionEnvelope::default();
        envelope.push_flash("session expired <script>");

        let response = app(&auth)
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .header(COOKIE, cookie_pair(&auth, &envelope))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let drained = read_set_cookie(&auth, &response);
        assert!(drained.flash.is_empty());

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let page = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(page.contains("session expired &lt;script&gt;"));
        assert!(page.contains("name=\"username\""));
        assert!(page.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_post_login_success_redirects_to_stored_target() {
        let auth = auth_state();
        let envelope = SessionEnvelope {
            redirect_target: Some("/search?q=test".to_string()),
            ..SessionEnvelope::default()
        };

        let response = app(&auth)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(COOKIE, cookie_pair(&auth, &envelope))
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=spencer&password=hunter2"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/search?q=test");

        let session = read_set_cookie(&auth, &response);
        let token: AuthToken = session.token.expect("token issued");
        assert_eq!(token.username, "spencer");
        assert!(session.redirect_target.is_none(), "target is consumed");
    }

    #[tokio::test]
    async fn test_post_login_success_defaults_to_root() {
        let auth = auth_state();
        let response = app(&auth)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=spencer&password=hunter2"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_post_login_failure_flashes_and_returns_to_form() {
        let auth = auth_state();
        let response = app(&auth)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=spencer&password=wrong"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");

        let session = read_set_cookie(&auth, &response);
        assert!(session.token.is_none());
        assert!(!session.flash.is_empty());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
