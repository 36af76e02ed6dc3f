//! hoard server
//!
//! Thin HTTP service around the `hoard-auth` core: a login page, a gated
//! search page, and a page-intake endpoint for the browser extension. The
//! archive itself sits behind the [`archive::PageStore`] seam.

pub mod archive;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod users;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
