use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_distill::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `candidate` is served by the same site as `origin`
///
/// Hosts are compared case-insensitively with a leading `www.` ignored on either
/// side, and the effective ports must agree.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_distill::url::same_site;
///
/// let origin = Url::parse("https://example.com/").unwrap();
/// assert!(same_site(&origin, &Url::parse("https://www.example.com/a").unwrap()));
/// assert!(!same_site(&origin, &Url::parse("https://cdn.example.com/a").unwrap()));
/// ```
pub fn same_site(origin: &Url, candidate: &Url) -> bool {
    let (Some(a), Some(b)) = (extract_domain(origin), extract_domain(candidate)) else {
        return false;
    };

    strip_www(&a) == strip_www(&b)
        && origin.port_or_known_default() == candidate.port_or_known_default()
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
