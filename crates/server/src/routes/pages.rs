//! Page intake from the browser extension

use axum::{extract::State, Json};
use hoard_auth::login::escape_html;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;
use url::Url;

use crate::archive::NewPage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What the extension sends. The bearer `token` field rides alongside and is
/// consumed by the authorizer; unknown fields are ignored here.
#[derive(Debug, Deserialize)]
pub struct PostPageRequest {
    pub url: String,
    pub title: String,
    #[serde(rename = "text")]
    pub text_content: String,
}

/// Archive a scraped page.
pub async fn save_page(
    State(state): State<AppState>,
    Json(content): Json<PostPageRequest>,
) -> AppResult<Json<Value>> {
    if content.url.is_empty() || content.title.is_empty() || content.text_content.is_empty() {
        return Err(AppError::BadRequest(
            "url, title and text are all required".to_string(),
        ));
    }

    let location = normalize_url(&content.url)
        .map_err(|_| AppError::BadRequest(format!("not a valid URL: {}", content.url)))?;

    // Escape once at intake; everything downstream treats these fields as
    // display-safe.
    let page = NewPage {
        url: location.to_string(),
        safe_title: escape_html(&content.title),
        safe_content: escape_html(&content.text_content),
        scraped_at: OffsetDateTime::now_utc(),
    };

    let url = page.url.clone();
    let id = state.pages.save(page)?;
    tracing::info!(id, %url, "archived page");
    Ok(Json(json!({ "id": id })))
}

/// Canonical form of an archived URL: fragment and userinfo dropped, query
/// kept because some sites key whole pages on it.
fn normalize_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut location = Url::parse(raw)?;
    location.set_fragment(None);
    let _ = location.set_username("");
    let _ = location.set_password(None);
    Ok(location)
}

/// Placeholder for single-page retrieval and deletion.
pub async fn not_implemented() -> AppError {
    AppError::NotImplemented
}
