use serde::Deserialize;

/// Main configuration structure for Site-Distill
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default = "FragmentMarker::default_header")]
    pub header: FragmentMarker,
    #[serde(default = "FragmentMarker::default_footer")]
    pub footer: FragmentMarker,
}

/// The origin site being mirrored
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the origin, e.g. `https://example.com`
    pub origin: String,

    /// Sitemap documents listing the pages to extract
    pub sitemaps: Vec<String>,

    /// Page tried first when locating the header and footer fragments
    #[serde(rename = "reference-page", default)]
    pub reference_page: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving page records, routes and fragments
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Directory that mirrors the site root; assets land under its static root
    #[serde(rename = "public-dir")]
    pub public_dir: String,
}

/// Canonical asset layout and download limits
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// CMS upload directory on the origin
    #[serde(rename = "uploads-prefix", default = "default_uploads_prefix")]
    pub uploads_prefix: String,

    /// Local root under which every mirrored asset is placed
    #[serde(rename = "static-root", default = "default_static_root")]
    pub static_root: String,

    /// Local prefix replacing the upload directory
    #[serde(rename = "images-prefix", default = "default_images_prefix")]
    pub images_prefix: String,

    /// Upper bound on simultaneous asset downloads for one page
    #[serde(rename = "max-concurrent-downloads", default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Redirect hops followed before an asset download is abandoned
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            uploads_prefix: default_uploads_prefix(),
            static_root: default_static_root(),
            images_prefix: default_images_prefix(),
            max_concurrent_downloads: default_max_concurrent(),
            max_redirects: default_max_redirects(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_uploads_prefix() -> String {
    "/wp-content/uploads/".to_string()
}

fn default_static_root() -> String {
    "/static".to_string()
}

fn default_images_prefix() -> String {
    "/static/images/".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_redirects() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

/// Site-specific vocabulary for the boilerplate classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Lowercase keywords that indicate a postal address
    #[serde(rename = "address-keywords", default = "default_address_keywords")]
    pub address_keywords: Vec<String>,

    /// Domains whose anchors count as social links
    #[serde(rename = "social-domains", default = "default_social_domains")]
    pub social_domains: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            address_keywords: default_address_keywords(),
            social_domains: default_social_domains(),
        }
    }
}

fn default_address_keywords() -> Vec<String> {
    ["saheel tower", "dubai", "uae", "p.o.box", "p.o. box"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_social_domains() -> Vec<String> {
    ["linkedin", "youtube", "facebook", "instagram", "twitter"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Locates a shared header or footer template inside any page
#[derive(Debug, Clone, Deserialize)]
pub struct FragmentMarker {
    /// Name used in logs and output file names (`header`, `footer`)
    pub name: String,

    /// CSS selector matching the fragment's root element
    pub selector: String,

    /// Class substring identifying the fragment's scoped `<style>` block
    #[serde(rename = "style-marker")]
    pub style_marker: String,

    /// Stylesheet filename fragments that belong to this template
    #[serde(rename = "css-files", default)]
    pub css_files: Vec<String>,
}

impl FragmentMarker {
    pub fn default_header() -> Self {
        Self {
            name: "header".to_string(),
            selector: r#"[data-elementor-type="wp-post"][data-elementor-id="3080"]"#.to_string(),
            style_marker: ".elementor-3080".to_string(),
            css_files: vec![
                "post-3080.css".to_string(),
                "custom-pro-widget-nav-menu.min.css".to_string(),
                "e-sticky.min.css".to_string(),
            ],
        }
    }

    pub fn default_footer() -> Self {
        Self {
            name: "footer".to_string(),
            selector: r#"[data-elementor-type="wp-post"][data-elementor-id="3084"]"#.to_string(),
            style_marker: ".elementor-3084".to_string(),
            css_files: vec!["post-3.css".to_string(), "post-3084.css".to_string()],
        }
    }
}
