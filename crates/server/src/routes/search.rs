//! Full-text search over the archive

use axum::{
    extract::{Query, State},
    response::Html,
};
use hoard_auth::login::escape_html;
use serde::Deserialize;

use crate::archive::{StoredPage, PAGE_SIZE};
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: usize,
}

/// Shown under each result; enough to recognize the page.
const SNIPPET_CHARS: usize = 240;

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Html<String>> {
    let results = state.pages.search(&params.q, params.page)?;

    let action = state.auth.config.prefixed("/search");
    let mut body = String::new();
    body.push_str("<!doctype html>\n<html>\n<head><title>Search</title></head>\n<body>\n");
    body.push_str(&format!(
        "<form action=\"{action}\" method=\"get\">\n\
         <input type=\"search\" name=\"q\" value=\"{}\" autofocus>\n\
         <button type=\"submit\">Search</button>\n</form>\n",
        escape_html(&params.q)
    ));

    if params.q.is_empty() {
        body.push_str("<p>Type a query to search your archive.</p>\n");
    } else if results.is_empty() {
        body.push_str("<p>No pages matched.</p>\n");
    } else {
        for page in &results {
            body.push_str(&render_result(page));
        }
        body.push_str(&render_pager(&action, &params, results.len()));
    }

    body.push_str("</body>\n</html>\n");
    Ok(Html(body))
}

fn render_result(page: &StoredPage) -> String {
    // Title and content were escaped at intake; the URL needs escaping for
    // the attribute position.
    let href = escape_html(&page.url);
    let snippet: String = page.safe_content.chars().take(SNIPPET_CHARS).collect();
    format!(
        "<article>\n<h2><a href=\"{href}\">{}</a></h2>\n<p>{snippet}</p>\n</article>\n",
        page.safe_title
    )
}

fn render_pager(action: &str, params: &SearchParams, result_count: usize) -> String {
    let mut pager = String::from("<nav>\n");
    if params.page > 0 {
        pager.push_str(&format!(
            "<a href=\"{}\">Newer</a>\n",
            page_link(action, &params.q, params.page - 1)
        ));
    }
    // A full window suggests more results behind it; an off-by-one ghost
    // page when the count is an exact multiple is harmless.
    if result_count == PAGE_SIZE {
        pager.push_str(&format!(
            "<a href=\"{}\">Older</a>\n",
            page_link(action, &params.q, params.page + 1)
        ));
    }
    pager.push_str("</nav>\n");
    pager
}

fn page_link(action: &str, query: &str, page: usize) -> String {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .append_pair("page", &page.to_string())
        .finish();
    format!("{action}?{encoded}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn stored(title: &str, content: &str, url: &str) -> StoredPage {
        StoredPage {
            id: 1,
            url: url.to_string(),
            safe_title: escape_html(title),
            safe_content: escape_html(content),
            scraped_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_render_result_links_the_original_url() {
        let html = render_result(&stored("A Title", "some body", "https://example.com/x?a=1&b=2"));
        assert!(html.contains("href=\"https://example.com/x?a=1&amp;b=2\""));
        assert!(html.contains("A Title"));
        assert!(html.contains("some body"));
    }

    #[test]
    fn test_page_link_encodes_the_query() {
        let link = page_link("/search", "rust & go", 2);
        assert_eq!(link, "/search?q=rust+%26+go&page=2");
    }

    #[test]
    fn test_pager_links() {
        let params = SearchParams {
            q: "x".to_string(),
            page: 1,
        };
        let pager = render_pager("/search", &params, PAGE_SIZE);
        assert!(pager.contains("page=0"));
        assert!(pager.contains("page=2"));

        let last = render_pager("/search", &params, PAGE_SIZE - 1);
        assert!(!last.contains("page=2"));
    }
}
