//! Crawler module for page discovery and run orchestration
//!
//! This module contains the core run logic, including:
//! - Sitemap fetching and `<loc>` extraction
//! - The page loop with per-page asset mirroring
//! - Writing indexes and the header/footer fragments

mod pipeline;
mod sitemap;

pub use pipeline::{run_pipeline, Pipeline};
pub use sitemap::{parse_urlset, SitemapCrawler};

use crate::config::Config;
use crate::output::RunSummary;
use crate::Result;

/// Runs a complete distill operation
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client and the run-scoped download cache
/// 2. List pages from the configured sitemaps
/// 3. Extract each page and mirror its assets
/// 4. Write the route and navigation indexes
/// 5. Extract the header and footer
///
/// # Arguments
///
/// * `config` - The run configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed; per-item failures are counted in the summary
/// * `Err(DistillError)` - Invalid configuration, missing header/footer, or unwritable output
pub async fn crawl(config: Config) -> Result<RunSummary> {
    run_pipeline(config).await
}
