//! Shared application state

use std::sync::Arc;

use axum::extract::FromRef;
use hoard_auth::AuthState;

use crate::archive::PageStore;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthState,
    pub pages: Arc<dyn PageStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(app: &AppState) -> AuthState {
        app.auth.clone()
    }
}
