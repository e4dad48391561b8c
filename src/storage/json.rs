//! JSON file storage implementation
//!
//! Layout under the data directory:
//!
//! ```text
//! pages/<slug>.json
//! routes.json
//! navigation.json
//! header.json
//! footer.json
//! ```

use crate::model::{HeaderFooterFragment, NavigationIndex, PageRecord, Route, RouteIndex};
use crate::storage::traits::{ContentStore, StorageError, StorageResult};
use crate::url::HOME_SLUG;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PAGES_DIR: &str = "pages";
const ROUTES_FILE: &str = "routes.json";
const NAVIGATION_FILE: &str = "navigation.json";
const HEADER_FILE: &str = "header.json";
const FOOTER_FILE: &str = "footer.json";

/// What a page write did on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The stored record already had the same content; the file was left untouched
    Unchanged,
}

/// JSON file storage backend
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    /// Creates a store rooted at `data_dir`
    ///
    /// Directories are created lazily on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn page_file(&self, slug: &str) -> PathBuf {
        self.data_dir.join(PAGES_DIR).join(format!("{}.json", slug))
    }

    /// Writes a page record
    ///
    /// If a stored record for the slug already holds the same content, the file is not
    /// rewritten, so its `extractedAt` and bytes stay as they were.
    pub fn write_page(&self, record: &PageRecord) -> StorageResult<WriteOutcome> {
        let path = self.page_file(&record.slug);

        match read_json::<PageRecord>(&path) {
            Ok(Some(existing)) if existing.same_content(record) => {
                tracing::debug!("Page {} unchanged, keeping {}", record.slug, path.display());
                return Ok(WriteOutcome::Unchanged);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Replacing unreadable record {}: {}", path.display(), e),
        }

        write_json(&path, record)?;
        Ok(WriteOutcome::Written)
    }

    /// Writes `routes.json`
    pub fn write_routes(&self, routes: &RouteIndex) -> StorageResult<()> {
        write_json(&self.data_dir.join(ROUTES_FILE), routes)
    }

    /// Writes `navigation.json`
    pub fn write_navigation(&self, navigation: &NavigationIndex) -> StorageResult<()> {
        write_json(&self.data_dir.join(NAVIGATION_FILE), navigation)
    }

    /// Writes `header.json`
    pub fn write_header(&self, header: &HeaderFooterFragment) -> StorageResult<()> {
        write_json(&self.data_dir.join(HEADER_FILE), header)
    }

    /// Writes `footer.json`
    pub fn write_footer(&self, footer: &HeaderFooterFragment) -> StorageResult<()> {
        write_json(&self.data_dir.join(FOOTER_FILE), footer)
    }

    /// Loads `navigation.json`
    pub fn load_navigation(&self) -> StorageResult<Option<NavigationIndex>> {
        read_json(&self.data_dir.join(NAVIGATION_FILE))
    }
}

impl ContentStore for JsonStore {
    fn load_by_slug(&self, slug: &str) -> StorageResult<Option<PageRecord>> {
        let Some(slug) = lookup_slug(slug) else {
            tracing::debug!("Rejected page slug {:?}", slug);
            return Ok(None);
        };
        read_json(&self.page_file(slug))
    }

    fn list_routes(&self) -> StorageResult<Vec<Route>> {
        Ok(read_json::<RouteIndex>(&self.data_dir.join(ROUTES_FILE))?
            .map(|index| index.routes)
            .unwrap_or_default())
    }

    fn load_header(&self) -> StorageResult<Option<HeaderFooterFragment>> {
        read_json(&self.data_dir.join(HEADER_FILE))
    }

    fn load_footer(&self) -> StorageResult<Option<HeaderFooterFragment>> {
        read_json(&self.data_dir.join(FOOTER_FILE))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Maps a requested slug onto a stored one
///
/// `""` and `index` name the home page. Slugs with empty, `.` or `..` segments
/// (or backslashes) never match a stored page.
fn lookup_slug(slug: &str) -> Option<&str> {
    if slug.is_empty() || slug == "index" {
        return Some(HOME_SLUG);
    }
    if slug.contains('\\') {
        return None;
    }
    slug.split('/')
        .all(|segment| !matches!(segment, "" | "." | ".."))
        .then_some(slug)
}

/// Reads a JSON file, `Ok(None)` if it does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Serializes `value` as pretty JSON and writes it atomically
fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');
    write_atomic(path, &json)
}

/// Writes `contents` to a sibling temp file and renames it over `path`
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).map_err(|e| io_error(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }
    Ok(())
}
