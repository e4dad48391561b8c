//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during a run:
//! - Building the HTTP client with a proper user agent string
//! - Following redirects manually with a hop limit and loop detection
//! - Fetching page and sitemap documents as text
//! - Streaming asset bodies to disk through a `.part` file

use crate::config::UserAgentConfig;
use crate::fetch::DownloadCache;
use crate::model::AssetReference;
use crate::url::PathRewriter;
use crate::FetchError;
use reqwest::{header::LOCATION, redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Result of fetching one asset
#[derive(Debug)]
pub enum FetchOutcome {
    /// The asset was downloaded during this call
    Downloaded,
    /// Nothing to do: present on disk, fetched earlier, or handled elsewhere in this run
    AlreadyPresent,
    /// The download failed; the local target is marked failed for the rest of the run
    Failed(FetchError),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_distill::config::UserAgentConfig;
/// use site_distill::fetch::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SiteDistill".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request, following redirects by hand
///
/// Each `Location` is resolved against the URL that produced it. A URL seen twice
/// in one chain is a loop; more than `max_redirects` hops is an error.
///
/// # Returns
///
/// The first non-redirect response, if it has a 2xx status
pub async fn get_following_redirects(
    client: &Client,
    url: &str,
    max_redirects: usize,
) -> Result<Response, FetchError> {
    let mut current = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
        url: url.to_string(),
    })?;
    let mut visited = HashSet::new();

    for _ in 0..=max_redirects {
        if !visited.insert(current.to_string()) {
            return Err(FetchError::RedirectLoop {
                url: current.to_string(),
            });
        }

        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: current.to_string(),
                source,
            })?;

        let status = response.status();

        if status.is_redirection() {
            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| current.join(location).ok())
                .ok_or_else(|| FetchError::BadRedirect {
                    url: current.to_string(),
                })?;

            tracing::debug!("Redirect {} -> {} ({})", current, next, status.as_u16());
            current = next;
            continue;
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: current.to_string(),
                status: status.as_u16(),
            });
        }

        return Ok(response);
    }

    Err(FetchError::RedirectLimit {
        url: url.to_string(),
    })
}

/// Fetches a document (page or sitemap) as text
pub async fn fetch_text(
    client: &Client,
    url: &str,
    max_redirects: usize,
) -> Result<String, FetchError> {
    let response = get_following_redirects(client, url, max_redirects).await?;
    response.text().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })
}

/// Downloads origin assets into the public directory, once per run
#[derive(Clone)]
pub struct AssetFetcher {
    client: Client,
    cache: Arc<DownloadCache>,
    rewriter: PathRewriter,
    public_dir: PathBuf,
    max_redirects: usize,
}

impl AssetFetcher {
    pub fn new(
        client: Client,
        cache: Arc<DownloadCache>,
        rewriter: PathRewriter,
        public_dir: PathBuf,
        max_redirects: usize,
    ) -> Self {
        Self {
            client,
            cache,
            rewriter,
            public_dir,
            max_redirects,
        }
    }

    pub fn cache(&self) -> &Arc<DownloadCache> {
        &self.cache
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Local file an asset is stored in, if its path is storable
    pub fn target_of(&self, asset: &AssetReference) -> Option<PathBuf> {
        self.rewriter.local_file(&self.public_dir, &asset.local_path)
    }

    /// True if the asset's download failed earlier in this run
    pub fn is_unavailable(&self, asset: &AssetReference) -> bool {
        self.target_of(asset)
            .map(|target| self.cache.is_failed(&target))
            .unwrap_or(true)
    }

    /// Fetches one asset unless the cache says it is already handled
    ///
    /// The body is streamed to `<target>.part` and renamed into place only after the
    /// whole response arrived. The partial file is removed on any failure.
    pub async fn fetch(&self, asset: &AssetReference) -> FetchOutcome {
        let Some(target) = self.target_of(asset) else {
            return FetchOutcome::Failed(FetchError::InvalidTarget {
                path: asset.local_path.clone(),
            });
        };

        if !self.cache.should_fetch(&target) {
            return FetchOutcome::AlreadyPresent;
        }

        match self.download(&asset.remote_url, &target).await {
            Ok(()) => {
                self.cache.mark_fetched(&target);
                tracing::debug!("Downloaded {} -> {}", asset.remote_url, asset.local_path);
                FetchOutcome::Downloaded
            }
            Err(e) => {
                self.cache.mark_failed(&target);
                FetchOutcome::Failed(e)
            }
        }
    }

    async fn download(&self, url: &str, target: &Path) -> Result<(), FetchError> {
        let response = get_following_redirects(&self.client, url, self.max_redirects).await?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let part = part_path(target);
        let written = match write_body(response, url, &part).await {
            Ok(()) => tokio::fs::rename(&part, target)
                .await
                .map_err(|source| io_error(target, source)),
            Err(e) => Err(e),
        };

        if written.is_err() {
            let _ = tokio::fs::remove_file(&part).await;
        }

        written
    }
}

async fn write_body(mut response: Response, url: &str, part: &Path) -> Result<(), FetchError> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|source| io_error(part, source))?;

    while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })? {
        file.write_all(&chunk)
            .await
            .map_err(|source| io_error(part, source))?;
    }

    file.flush().await.map_err(|source| io_error(part, source))
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn fetcher(origin: &str, public_dir: &Path) -> AssetFetcher {
        let client = build_http_client(&create_test_config(), 5).unwrap();
        let rewriter = PathRewriter::new(Url::parse(origin).unwrap(), &AssetsConfig::default());
        AssetFetcher::new(
            client,
            Arc::new(DownloadCache::new()),
            rewriter,
            public_dir.to_path_buf(),
            10,
        )
    }

    fn asset(origin: &str, remote_path: &str, local_path: &str) -> AssetReference {
        AssetReference {
            remote_url: format!("{}{}", origin, remote_path),
            local_path: local_path.to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, 30);
        assert!(client.is_ok());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/srv/static/a.css")),
            PathBuf::from("/srv/static/a.css.part")
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_file_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-content/uploads/logo.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg/>"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server.uri(), dir.path());
        let logo = asset(
            &server.uri(),
            "/wp-content/uploads/logo.svg",
            "/static/images/logo.svg",
        );

        assert!(matches!(fetcher.fetch(&logo).await, FetchOutcome::Downloaded));
        assert!(matches!(fetcher.fetch(&logo).await, FetchOutcome::AlreadyPresent));

        let written = std::fs::read_to_string(dir.path().join("static/images/logo.svg")).unwrap();
        assert_eq!(written, "<svg/>");
        assert!(!dir.path().join("static/images/logo.svg.part").exists());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect_and_keeps_original_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.png"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/real.png"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/real.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server.uri(), dir.path());
        let img = asset(&server.uri(), "/old.png", "/static/old.png");

        assert!(matches!(fetcher.fetch(&img).await, FetchOutcome::Downloaded));
        assert_eq!(std::fs::read(dir.path().join("static/old.png")).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_redirect_loop_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config(), 5).unwrap();
        let result = get_following_redirects(&client, &format!("{}/a", server.uri()), 10).await;
        assert!(matches!(result, Err(FetchError::RedirectLoop { .. })));
    }

    #[tokio::test]
    async fn test_non_success_status_fails_without_leftovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.css"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server.uri(), dir.path());
        let css = asset(&server.uri(), "/missing.css", "/static/missing.css");

        match fetcher.fetch(&css).await {
            FetchOutcome::Failed(FetchError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404 failure, got {:?}", other),
        }
        assert!(fetcher.is_unavailable(&css));
        assert!(!dir.path().join("static/missing.css").exists());
        assert!(!dir.path().join("static/missing.css.part").exists());

        // Not retried within the run
        assert!(matches!(fetcher.fetch(&css).await, FetchOutcome::AlreadyPresent));
    }
}
