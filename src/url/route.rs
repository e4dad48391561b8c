use url::Url;

/// Slug given to the site root
pub const HOME_SLUG: &str = "home";

/// A page's stable identity: its slug and the route path it is served under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRoute {
    pub slug: String,
    pub path: String,
}

impl PageRoute {
    /// Derives the route of a page URL
    ///
    /// # Normalization Steps
    ///
    /// 1. Split the path into segments, dropping empty and `.` segments
    /// 2. Resolve `..` against the segments seen so far
    /// 3. Drop a trailing `index.html`/`index.htm` and strip `.html`/`.htm` from the last segment
    /// 4. The root maps to slug `home` and path `/`; everything else joins with `/`
    ///
    /// Query and fragment never take part, so `/about`, `/about/` and
    /// `/about/index.html?x=1` share one route.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_distill::url::PageRoute;
    /// use url::Url;
    ///
    /// let route = PageRoute::from_url(&Url::parse("https://example.com/services/web/").unwrap());
    /// assert_eq!(route.slug, "services/web");
    /// assert_eq!(route.path, "/services/web");
    /// ```
    pub fn from_url(url: &Url) -> Self {
        Self::from_path(url.path())
    }

    /// Derives the route of a root-relative path
    pub fn from_path(path: &str) -> Self {
        let mut segments = normalize_segments(path);

        if let Some(last) = segments.pop() {
            let lower = last.to_ascii_lowercase();
            if lower != "index.html" && lower != "index.htm" {
                let stem = strip_html_extension(&last);
                if !stem.is_empty() {
                    segments.push(stem.to_string());
                }
            }
        }

        if segments.is_empty() {
            return Self {
                slug: HOME_SLUG.to_string(),
                path: "/".to_string(),
            };
        }

        let slug = segments.join("/");
        Self {
            path: format!("/{}", slug),
            slug,
        }
    }
}

/// Normalizes a route path for lookups: `about/`, `/about` and `/about/` become `/about`
pub fn normalize_route_path(path: &str) -> String {
    let segments = normalize_segments(path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn normalize_segments(path: &str) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized.pop();
            }
            _ => normalized.push(segment.to_string()),
        }
    }

    normalized
}

fn strip_html_extension(segment: &str) -> &str {
    let lower = segment.to_ascii_lowercase();
    for ext in [".html", ".htm"] {
        if lower.ends_with(ext) {
            return &segment[..segment.len() - ext.len()];
        }
    }
    segment
}
