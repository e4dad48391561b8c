//! Fetching module: HTTP client, redirect handling and the run-scoped download cache

mod cache;
mod fetcher;

pub use cache::DownloadCache;
pub use fetcher::{
    build_http_client, fetch_text, get_following_redirects, AssetFetcher, FetchOutcome,
};
