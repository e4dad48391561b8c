//! Site-Distill: turns a crawled page-builder site into a local content model
//!
//! This crate discovers pages through sitemaps, mirrors every origin asset exactly once,
//! separates the site-wide header and footer from page content, and writes one JSON
//! record per page whose HTML and CSS reference only local paths.

pub mod config;
pub mod crawler;
pub mod css;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Distill operations
#[derive(Debug, Error)]
pub enum DistillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Sitemap parse error for {url}: {message}")]
    SitemapParse { url: String, message: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Fragment '{name}' not found in any crawled document")]
    FragmentNotFound { name: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Errors raised while downloading a single asset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Invalid URL '{url}'")]
    InvalidUrl { url: String },

    #[error("No local file for asset path '{path}'")]
    InvalidTarget { path: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Redirect from {url} has no usable Location header")]
    BadRedirect { url: String },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Site-Distill operations
pub type Result<T> = std::result::Result<T, DistillError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{HeaderFooterFragment, PageRecord};
pub use crate::url::{PathRewriter, RefKind, Rewritten};
