use crate::config::types::{
    AssetsConfig, Config, FragmentMarker, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::url::same_site;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_assets_config(&config.assets)?;
    validate_fragment_marker(&config.header)?;
    validate_fragment_marker(&config.footer)?;
    Ok(())
}

/// Validates the origin, sitemap list and reference page
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let origin = parse_http_url("origin", &config.origin)?;

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' has no host",
            config.origin
        )));
    }

    if config.sitemaps.is_empty() {
        return Err(ConfigError::Validation(
            "at least one sitemap URL is required".to_string(),
        ));
    }

    for sitemap in &config.sitemaps {
        parse_http_url("sitemap", sitemap)?;
    }

    if let Some(reference) = &config.reference_page {
        validate_reference_page(&origin, reference)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.public_dir.is_empty() {
        return Err(ConfigError::Validation(
            "public_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the canonical asset layout and download limits
fn validate_assets_config(config: &AssetsConfig) -> Result<(), ConfigError> {
    for (name, prefix) in [
        ("uploads_prefix", &config.uploads_prefix),
        ("images_prefix", &config.images_prefix),
    ] {
        if !prefix.starts_with('/') || !prefix.ends_with('/') || prefix.len() < 3 {
            return Err(ConfigError::Validation(format!(
                "{} must start and end with '/', got '{}'",
                name, prefix
            )));
        }
    }

    if !config.static_root.starts_with('/')
        || config.static_root.ends_with('/')
        || config.static_root.len() < 2
    {
        return Err(ConfigError::Validation(format!(
            "static_root must start with '/' and not end with one, got '{}'",
            config.static_root
        )));
    }

    if !config
        .images_prefix
        .starts_with(&format!("{}/", config.static_root))
    {
        return Err(ConfigError::Validation(format!(
            "images_prefix '{}' must live under static_root '{}'",
            config.images_prefix, config.static_root
        )));
    }

    if config.max_concurrent_downloads < 1 || config.max_concurrent_downloads > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_downloads must be between 1 and 32, got {}",
            config.max_concurrent_downloads
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a header/footer marker
fn validate_fragment_marker(marker: &FragmentMarker) -> Result<(), ConfigError> {
    if marker.name.is_empty()
        || !marker
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "fragment name must be a non-empty identifier, got '{}'",
            marker.name
        )));
    }

    Selector::parse(&marker.selector).map_err(|e| {
        ConfigError::InvalidSelector(format!(
            "{} selector '{}': {:?}",
            marker.name, marker.selector, e
        ))
    })?;

    if marker.style_marker.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} style_marker cannot be empty",
            marker.name
        )));
    }

    Ok(())
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}

/// Accepts a root-relative path like `/about/`, or an absolute URL on the origin
fn validate_reference_page(origin: &Url, reference: &str) -> Result<(), ConfigError> {
    if reference.starts_with('/') && !reference.starts_with("//") {
        origin.join(reference).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid reference-page '{}': {}", reference, e))
        })?;
        return Ok(());
    }

    let url = parse_http_url("reference-page", reference)?;
    if !same_site(origin, &url) {
        return Err(ConfigError::Validation(format!(
            "reference-page '{}' is not on the origin",
            reference
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
