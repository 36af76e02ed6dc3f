//! Route wiring

pub mod pages;
pub mod search;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use hoard_auth::{login, require_auth};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all routes. Everything except the login page sits behind the
/// authorizer.
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/login", get(login::get_login).post(login::post_login))
        .with_state(auth_state.clone());

    let protected_routes = Router::new()
        .route("/search", get(search::search))
        .route("/pages", post(pages::save_page))
        .route(
            "/pages/:id",
            get(pages::not_implemented).delete(pages::not_implemented),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state.clone());

    let search_path = state.auth.config.prefixed("/search");
    Router::new()
        .route(
            "/",
            get(move || {
                let to = search_path.clone();
                async move { Redirect::to(&to) }
            }),
        )
        .merge(public_routes)
        .merge(protected_routes)
        // Page bodies carry whole article texts; cap them like any other
        // request.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
