//! Storage traits and error types
//!
//! This module defines the read contract the presentation layer relies on and the
//! errors raised by storage backends.

use crate::model::{HeaderFooterFragment, PageRecord, Route};
use crate::url::normalize_route_path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read access to extracted content
///
/// Missing records are reported as `Ok(None)`; errors are reserved for unreadable or
/// corrupt output.
pub trait ContentStore {
    /// Loads a page by its slug
    fn load_by_slug(&self, slug: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists every known route, sorted by path
    fn list_routes(&self) -> StorageResult<Vec<Route>>;

    /// Loads the site-wide header fragment
    fn load_header(&self) -> StorageResult<Option<HeaderFooterFragment>>;

    /// Loads the site-wide footer fragment
    fn load_footer(&self) -> StorageResult<Option<HeaderFooterFragment>>;

    /// Loads a page by its route path
    ///
    /// Leading and trailing slashes are ignored, so `about`, `/about` and `/about/`
    /// all name the same page.
    fn load_by_path(&self, path: &str) -> StorageResult<Option<PageRecord>> {
        let wanted = normalize_route_path(path);
        let Some(route) = self
            .list_routes()?
            .into_iter()
            .find(|route| normalize_route_path(&route.path) == wanted)
        else {
            return Ok(None);
        };
        self.load_by_slug(&route.slug)
    }
}
