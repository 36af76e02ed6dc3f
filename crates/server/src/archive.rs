//! The archive seam
//!
//! Real persistence and search ranking belong to the storage collaborator;
//! the service only depends on this trait. The in-memory store keeps a
//! single process useful for development and tests.

use std::sync::Mutex;

use time::OffsetDateTime;

/// A scraped page as submitted by the extension, already HTML-escaped at
/// intake.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub url: String,
    pub safe_title: String,
    pub safe_content: String,
    pub scraped_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct StoredPage {
    pub id: u64,
    pub url: String,
    pub safe_title: String,
    pub safe_content: String,
    pub scraped_at: OffsetDateTime,
}

/// Storage collaborator contract.
pub trait PageStore: Send + Sync {
    /// Persist a page, returning its id.
    fn save(&self, page: NewPage) -> Result<u64, ArchiveError>;
    /// Newest-first pages matching the query; an empty query matches
    /// nothing. `page` selects a window of [`PAGE_SIZE`] results.
    fn search(&self, query: &str, page: usize) -> Result<Vec<StoredPage>, ArchiveError>;
}

/// Results per search page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive store unavailable")]
    Unavailable,
}

/// Process-local store; contents vanish on restart.
#[derive(Default)]
pub struct MemoryStore {
    pages: Mutex<Vec<StoredPage>>,
}

impl PageStore for MemoryStore {
    fn save(&self, page: NewPage) -> Result<u64, ArchiveError> {
        let mut pages = self.pages.lock().map_err(|_| ArchiveError::Unavailable)?;
        let id = pages.len() as u64 + 1;
        pages.push(StoredPage {
            id,
            url: page.url,
            safe_title: page.safe_title,
            safe_content: page.safe_content,
            scraped_at: page.scraped_at,
        });
        Ok(id)
    }

    fn search(&self, query: &str, page: usize) -> Result<Vec<StoredPage>, ArchiveError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pages = self.pages.lock().map_err(|_| ArchiveError::Unavailable)?;
        let needle = query.to_lowercase();
        Ok(pages
            .iter()
            .rev()
            .filter(|p| {
                p.safe_title.to_lowercase().contains(&needle)
                    || p.safe_content.to_lowercase().contains(&needle)
                    || p.url.to_lowercase().contains(&needle)
            })
            .skip(page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect())
    }
}
