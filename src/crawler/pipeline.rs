//! Pipeline - main run orchestration logic
//!
//! This module contains the run loop that coordinates every stage of a run:
//! - Listing pages from the configured sitemaps
//! - Fetching and extracting each page in turn
//! - Mirroring the assets each page references, stylesheets included
//! - Writing page records, route and navigation indexes
//! - Extracting the site-wide header and footer

use crate::config::{Config, FragmentMarker};
use crate::crawler::SitemapCrawler;
use crate::css::CssAssetScanner;
use crate::extract::{FragmentExtractor, PageExtractor};
use crate::fetch::{build_http_client, fetch_text, AssetFetcher, DownloadCache, FetchOutcome};
use crate::model::{
    AssetReference, HeaderFooterFragment, NavigationIndex, NavigationItem, Route, RouteIndex,
};
use crate::output::RunSummary;
use crate::storage::{write_atomic, JsonStore, WriteOutcome};
use crate::url::{same_site, PathRewriter, HOME_SLUG};
use crate::Result;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// A page document kept for header/footer lookup after the page loop
type Document = (Url, String);

/// Everything learned from one processed page
struct ProcessedPage {
    route: Route,
    navigation: Vec<NavigationItem>,
    document: Document,
}

/// Main run pipeline structure
pub struct Pipeline {
    config: Arc<Config>,
    origin: Url,
    client: Client,
    sitemaps: SitemapCrawler,
    fetcher: AssetFetcher,
    scanner: CssAssetScanner,
    pages: PageExtractor,
    fragments: FragmentExtractor,
    store: JsonStore,
}

impl Pipeline {
    /// Creates a new pipeline instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Successfully created pipeline
    /// * `Err(DistillError)` - Invalid origin, selectors, or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self> {
        let origin = Url::parse(&config.site.origin)?;
        let client = build_http_client(&config.user_agent, config.assets.timeout_secs)?;
        let rewriter = PathRewriter::new(origin.clone(), &config.assets);

        let cache = Arc::new(DownloadCache::new());
        let fetcher = AssetFetcher::new(
            client.clone(),
            cache,
            rewriter.clone(),
            PathBuf::from(&config.output.public_dir),
            config.assets.max_redirects,
        );

        Ok(Self {
            origin,
            sitemaps: SitemapCrawler::new(client.clone(), config.assets.max_redirects),
            scanner: CssAssetScanner::new(rewriter.clone()),
            pages: PageExtractor::new(&config, rewriter.clone())?,
            fragments: FragmentExtractor::new(rewriter),
            store: JsonStore::new(&config.output.data_dir),
            fetcher,
            client,
            config: Arc::new(config),
        })
    }

    /// Runs the pipeline over every page listed in the sitemaps
    ///
    /// Per-page and per-asset failures are logged and counted in the summary. The run
    /// only fails for a header or footer that cannot be located, or an index that
    /// cannot be written.
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();
        let mut summary = RunSummary::default();

        let urls = self.sitemaps.collect(&self.config.site.sitemaps).await;
        tracing::info!("Starting run over {} sitemap URLs", urls.len());

        let mut seen_slugs = HashSet::new();
        let mut routes = Vec::new();
        let mut home_navigation = None;
        let mut first_navigation = None;
        let mut corpus: Vec<Document> = Vec::new();

        for url in &urls {
            let page_url = match Url::parse(url) {
                Ok(u) if same_site(&self.origin, &u) => u,
                Ok(_) => {
                    tracing::warn!("Skipping {}: not on origin {}", url, self.origin);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping invalid sitemap URL {}: {}", url, e);
                    continue;
                }
            };

            let page = match self.process_page(&page_url, &mut seen_slugs, &mut summary).await {
                Ok(Some(page)) => page,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Error processing {}: {}", page_url, e);
                    summary.pages_failed += 1;
                    continue;
                }
            };

            summary.pages_processed += 1;

            if !page.navigation.is_empty() {
                if page.route.slug == HOME_SLUG {
                    home_navigation = Some(page.navigation.clone());
                }
                first_navigation.get_or_insert(page.navigation);
            }
            routes.push(page.route);
            corpus.push(page.document);

            if summary.pages_processed % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = summary.pages_processed as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} pages processed, {} assets downloaded, {:.2} pages/sec",
                    summary.pages_processed,
                    summary.assets_downloaded,
                    rate
                );
            }
        }

        let routes = RouteIndex::new(routes);
        self.store.write_routes(&routes)?;
        tracing::info!("Wrote {} routes to {}", routes.total, self.store.data_dir().display());

        let navigation = NavigationIndex {
            items: home_navigation.or(first_navigation).unwrap_or_default(),
        };
        self.store.write_navigation(&navigation)?;

        let reference = self.reference_document(&corpus).await;
        let reference = reference.as_ref().map(|(url, html)| (url, html.as_str()));

        let header = self
            .distill_fragment(&self.config.header, reference, &corpus, &mut summary)
            .await?;
        self.store.write_header(&header)?;

        let footer = self
            .distill_fragment(&self.config.footer, reference, &corpus, &mut summary)
            .await?;
        self.store.write_footer(&footer)?;

        tracing::info!(
            "Run completed: {} pages processed, {} assets mirrored in {:?}",
            summary.pages_processed,
            self.fetcher.cache().fetched_count(),
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Processes a single page
    ///
    /// This method:
    /// 1. Fetches the page document
    /// 2. Extracts the page record and its asset references
    /// 3. Downloads the assets
    /// 4. Re-extracts with failed assets left remote, if any failed
    /// 5. Writes the page record
    ///
    /// Returns None for a page whose slug was already processed in this run.
    async fn process_page(
        &self,
        page_url: &Url,
        seen_slugs: &mut HashSet<String>,
        summary: &mut RunSummary,
    ) -> Result<Option<ProcessedPage>> {
        tracing::debug!("Processing URL: {}", page_url);

        let html = fetch_text(&self.client, page_url.as_str(), self.config.assets.max_redirects)
            .await?;

        let mut extracted = self.pages.extract(&html, page_url);
        if !seen_slugs.insert(extracted.record.slug.clone()) {
            tracing::debug!("Slug {} already processed, skipping {}", extracted.record.slug, page_url);
            return Ok(None);
        }

        self.fetch_assets(&extracted.assets, summary).await;

        let unavailable = self.unavailable_paths(&extracted.assets);
        if !unavailable.is_empty() {
            tracing::info!(
                "{} assets of {} unavailable, keeping remote URLs",
                unavailable.len(),
                page_url
            );
            extracted = self.pages.extract_with(&html, page_url, &unavailable);
        }

        let record = extracted.record;
        match self.store.write_page(&record)? {
            WriteOutcome::Written => tracing::info!("Wrote page {}", record.slug),
            WriteOutcome::Unchanged => tracing::debug!("Page {} unchanged", record.slug),
        }

        Ok(Some(ProcessedPage {
            route: Route {
                slug: record.slug,
                path: record.path,
            },
            navigation: record.navigation,
            document: (page_url.clone(), html),
        }))
    }

    /// Downloads assets, then processes every stylesheet downloaded along the way
    ///
    /// Stylesheets are handled through a work queue: each one is scanned, its own
    /// assets fetched, missing imports synthesized, and the file rewritten in place.
    async fn fetch_assets(&self, assets: &[AssetReference], summary: &mut RunSummary) {
        let mut stylesheets = self.fetch_batch(assets, summary).await;

        while let Some(stylesheet) = stylesheets.pop() {
            match self.process_stylesheet(&stylesheet, summary).await {
                Ok(nested) => stylesheets.extend(nested),
                Err(e) => tracing::warn!("Failed to process stylesheet {}: {}", stylesheet.local_path, e),
            }
        }
    }

    /// Fetches one batch with bounded concurrency, returning the stylesheets downloaded
    async fn fetch_batch(
        &self,
        assets: &[AssetReference],
        summary: &mut RunSummary,
    ) -> Vec<AssetReference> {
        let fetcher = &self.fetcher;
        let results: Vec<(AssetReference, FetchOutcome)> = stream::iter(assets.iter().cloned())
            .map(|asset| async move {
                let outcome = fetcher.fetch(&asset).await;
                (asset, outcome)
            })
            .buffer_unordered(self.config.assets.max_concurrent_downloads.max(1))
            .collect()
            .await;

        let mut stylesheets = Vec::new();
        for (asset, outcome) in results {
            match outcome {
                FetchOutcome::Downloaded => {
                    summary.assets_downloaded += 1;
                    if is_stylesheet(&asset) {
                        stylesheets.push(asset);
                    }
                }
                FetchOutcome::AlreadyPresent => summary.assets_skipped += 1,
                FetchOutcome::Failed(e) => {
                    tracing::warn!("Failed to fetch {}: {}", asset.remote_url, e);
                    summary.assets_failed += 1;
                }
            }
        }
        stylesheets
    }

    /// Mirrors the assets of a downloaded stylesheet and rewrites it in place
    ///
    /// # Returns
    ///
    /// Stylesheets downloaded while mirroring, still to be processed
    async fn process_stylesheet(
        &self,
        stylesheet: &AssetReference,
        summary: &mut RunSummary,
    ) -> Result<Vec<AssetReference>> {
        let Some(target) = self.fetcher.target_of(stylesheet) else {
            return Ok(Vec::new());
        };
        let css_url = Url::parse(&stylesheet.remote_url)?;
        let css = tokio::fs::read_to_string(&target).await?;

        let assets = self.scanner.scan(&css, &css_url);
        let nested = self.fetch_batch(&assets, summary).await;

        summary.css_imports_synthesized += self
            .scanner
            .ensure_imports(self.fetcher.public_dir(), &css, &css_url)
            .await?;

        let unavailable = self.unavailable_paths(&assets);
        let rewritten = self.scanner.rewrite_with(&css, &css_url, &unavailable);
        if rewritten != css {
            write_atomic(&target, rewritten.as_bytes())?;
            tracing::debug!("Rewrote stylesheet {}", stylesheet.local_path);
        }

        Ok(nested)
    }

    /// Local paths of assets that failed to download and have no file on disk
    fn unavailable_paths(&self, assets: &[AssetReference]) -> HashSet<String> {
        assets
            .iter()
            .filter(|asset| self.fetcher.is_unavailable(asset))
            .filter(|asset| {
                self.fetcher
                    .target_of(asset)
                    .map_or(true, |target| !target.exists())
            })
            .map(|asset| asset.local_path.clone())
            .collect()
    }

    /// The document searched first for the header and footer
    ///
    /// Defaults to the origin root. Taken from the crawled corpus when present,
    /// fetched otherwise.
    async fn reference_document(&self, corpus: &[Document]) -> Option<Document> {
        let page = self.config.site.reference_page.as_deref().unwrap_or("/");
        let url = match self.origin.join(page) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid reference page {}: {}", page, e);
                return None;
            }
        };

        if let Some(document) = corpus.iter().find(|(u, _)| *u == url) {
            return Some(document.clone());
        }

        match fetch_text(&self.client, url.as_str(), self.config.assets.max_redirects).await {
            Ok(html) => Some((url, html)),
            Err(e) => {
                tracing::warn!("Failed to fetch reference page {}: {}", url, e);
                None
            }
        }
    }

    /// Locates a header or footer fragment and mirrors its assets
    async fn distill_fragment(
        &self,
        marker: &FragmentMarker,
        reference: Option<(&Url, &str)>,
        corpus: &[Document],
        summary: &mut RunSummary,
    ) -> Result<HeaderFooterFragment> {
        let found = self.fragments.locate(reference, corpus, marker)?;
        self.fetch_assets(&found.assets, summary).await;

        let unavailable = self.unavailable_paths(&found.assets);
        if unavailable.is_empty() {
            return Ok(found.fragment);
        }

        let source_html = reference
            .filter(|(url, _)| **url == found.source)
            .map(|(_, html)| html)
            .or_else(|| {
                corpus
                    .iter()
                    .find(|(url, _)| *url == found.source)
                    .map(|(_, html)| html.as_str())
            });

        let fragment = source_html
            .and_then(|html| {
                self.fragments
                    .extract_fragment_with(html, &found.source, marker, &unavailable)
            })
            .map(|refound| refound.fragment)
            .unwrap_or(found.fragment);

        Ok(fragment)
    }
}

fn is_stylesheet(asset: &AssetReference) -> bool {
    asset.local_path.to_ascii_lowercase().ends_with(".css")
}

/// Runs a complete pipeline with the given configuration
pub async fn run_pipeline(config: Config) -> Result<RunSummary> {
    let pipeline = Pipeline::new(config)?;
    pipeline.run().await
}
