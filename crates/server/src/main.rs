//! hoard server entry point

use std::sync::Arc;

use anyhow::Context;
use hoard_auth::{AuthConfig, AuthState};
use hoard_server::archive::MemoryStore;
use hoard_server::routes::create_router;
use hoard_server::users::SingleUserStore;
use hoard_server::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; deployments set the environment directly.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env().context("loading server configuration")?);
    let auth_config = Arc::new(AuthConfig::from_env().context("loading auth configuration")?);

    let store = Arc::new(SingleUserStore::new(
        config.username.clone(),
        config.password_hash.clone(),
    ));
    let auth = AuthState::new(auth_config, store).context("initializing auth")?;

    let state = AppState {
        config: config.clone(),
        auth,
        pages: Arc::new(MemoryStore::default()),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    tracing::info!(address = %config.bind_address, "hoard listening");
    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}
