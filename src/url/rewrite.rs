//! Canonical path rewriting
//!
//! Every reference found in HTML attributes, inline styles and CSS files goes through
//! [`PathRewriter::rewrite`]. The rules, in precedence order:
//!
//! 1. data URIs, other non-HTTP schemes, empty and fragment-only references pass through
//! 2. references already under the static root are returned unchanged
//! 3. protocol-relative references take the origin's scheme
//! 4. root-relative and bare-relative references resolve against the containing
//!    document (the HTML page or the CSS file)
//! 5. absolute references on the origin reduce to their path; query and fragment go
//! 6. upload paths move under the image prefix, other asset paths mirror under the
//!    static root, page links keep their path
//!
//! References to other hosts stay absolute. Nothing here can fail: a reference that
//! does not parse is handed back untouched.

use crate::config::AssetsConfig;
use crate::model::AssetReference;
use crate::url::same_site;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// How a reference is used by the document containing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// A resource the page loads: images, stylesheets, scripts, fonts
    Asset,
    /// A navigational link to another page
    Page,
}

/// Outcome of rewriting one reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rewritten {
    /// Canonical local path on the mirrored site
    Local(String),
    /// Absolute URL on another host, left remote
    Remote(String),
    /// Original text kept as is
    Passthrough(String),
}

impl Rewritten {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(s) | Self::Remote(s) | Self::Passthrough(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Local(s) | Self::Remote(s) | Self::Passthrough(s) => s,
        }
    }

    /// Returns the local path if the reference was localized
    pub fn local_path(&self) -> Option<&str> {
        match self {
            Self::Local(s) => Some(s),
            _ => None,
        }
    }
}

/// Maps origin references onto the canonical local layout
#[derive(Debug, Clone)]
pub struct PathRewriter {
    origin: Url,
    uploads_prefix: String,
    images_prefix: String,
    static_root: String,
}

impl PathRewriter {
    /// Creates a rewriter for the given origin and asset layout
    pub fn new(origin: Url, assets: &AssetsConfig) -> Self {
        Self {
            origin,
            uploads_prefix: assets.uploads_prefix.clone(),
            images_prefix: assets.images_prefix.clone(),
            static_root: assets.static_root.trim_end_matches('/').to_string(),
        }
    }

    /// Rewrites one reference found in a document located at `base`
    ///
    /// # Examples
    ///
    /// ```
    /// use site_distill::config::AssetsConfig;
    /// use site_distill::url::{PathRewriter, RefKind, Rewritten};
    /// use url::Url;
    ///
    /// let rewriter = PathRewriter::new(
    ///     Url::parse("https://example.com").unwrap(),
    ///     &AssetsConfig::default(),
    /// );
    /// let page = Url::parse("https://example.com/about/").unwrap();
    ///
    /// assert_eq!(
    ///     rewriter.rewrite("../wp-content/uploads/2024/05/logo.svg", &page, RefKind::Asset),
    ///     Rewritten::Local("/static/images/2024/05/logo.svg".to_string())
    /// );
    /// ```
    pub fn rewrite(&self, raw: &str, base: &Url, kind: RefKind) -> Rewritten {
        let trimmed = raw.trim();

        if is_passthrough(trimmed) {
            return Rewritten::Passthrough(raw.to_string());
        }

        if self.is_canonical(trimmed) {
            return Rewritten::Local(trimmed.to_string());
        }

        let Some(url) = self.resolve(trimmed, base) else {
            return Rewritten::Passthrough(raw.to_string());
        };

        if !same_site(&self.origin, &url) {
            return Rewritten::Remote(url.to_string());
        }

        Rewritten::Local(self.localize(url.path(), kind))
    }

    /// Rewrites a reference, keeping failed downloads remote
    ///
    /// A reference that would become one of the `unavailable` local paths is returned
    /// as its absolute origin URL instead, so the page never points at a missing file.
    pub fn rewrite_with(
        &self,
        raw: &str,
        base: &Url,
        kind: RefKind,
        unavailable: &HashSet<String>,
    ) -> Rewritten {
        let rewritten = self.rewrite(raw, base, kind);

        if let Rewritten::Local(path) = &rewritten {
            if unavailable.contains(path) {
                if let Some(url) = self.resolve(raw, base) {
                    return Rewritten::Remote(url.to_string());
                }
            }
        }

        rewritten
    }

    /// Resolves a reference to an absolute HTTP(S) URL
    ///
    /// Returns None for references that are not fetchable over HTTP or do not parse.
    pub fn resolve(&self, raw: &str, base: &Url) -> Option<Url> {
        let trimmed = raw.trim();
        if is_passthrough(trimmed) {
            return None;
        }

        let resolved = if trimmed.starts_with("//") {
            Url::parse(&format!("{}:{}", self.origin.scheme(), trimmed))
        } else {
            base.join(trimmed)
        };

        resolved
            .ok()
            .filter(|url| url.scheme() == "http" || url.scheme() == "https")
    }

    /// Builds the download pairing for an origin asset
    ///
    /// Returns None for remote hosts, non-HTTP references, references that are already
    /// local, and directory-like paths that cannot be stored as a file.
    pub fn asset_reference(&self, raw: &str, base: &Url) -> Option<AssetReference> {
        let trimmed = raw.trim();
        if self.is_canonical(trimmed) {
            return None;
        }

        let mut url = self.resolve(trimmed, base)?;
        if !same_site(&self.origin, &url) {
            return None;
        }

        let local_path = self.localize(url.path(), RefKind::Asset);
        if local_path.ends_with('/') || local_path == self.static_root {
            return None;
        }

        url.set_query(None);
        url.set_fragment(None);

        Some(AssetReference {
            remote_url: url.to_string(),
            local_path,
        })
    }

    /// True if `path` is already in canonical local form
    pub fn is_canonical(&self, path: &str) -> bool {
        path.strip_prefix(self.static_root.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Maps a canonical local path to its file under `public_dir`
    ///
    /// Returns None for non-canonical or directory-like paths and for paths with
    /// empty, `.` or `..` segments.
    pub fn local_file(&self, public_dir: &Path, local_path: &str) -> Option<PathBuf> {
        if !self.is_canonical(local_path) || local_path.ends_with('/') {
            return None;
        }

        let relative = local_path.trim_start_matches('/');
        if relative
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return None;
        }

        Some(public_dir.join(relative))
    }

    fn localize(&self, path: &str, kind: RefKind) -> String {
        if let Some(rest) = path.strip_prefix(self.uploads_prefix.as_str()) {
            return format!("{}{}", self.images_prefix, rest);
        }

        if self.is_canonical(path) {
            return path.to_string();
        }

        match kind {
            RefKind::Page => path.to_string(),
            RefKind::Asset => format!("{}{}", self.static_root, path),
        }
    }
}

/// References that are never rewritten: empty, fragment-only, or a non-HTTP scheme
fn is_passthrough(raw: &str) -> bool {
    if raw.is_empty() || raw.starts_with('#') {
        return true;
    }

    match scheme_of(raw) {
        Some(scheme) => {
            !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https")
        }
        None => false,
    }
}

fn scheme_of(raw: &str) -> Option<&str> {
    let idx = raw.find(':')?;
    let scheme = &raw[..idx];
    let mut chars = scheme.chars();
    let first = chars.next()?;

    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
    {
        Some(scheme)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> PathRewriter {
        PathRewriter::new(
            Url::parse("https://example.com").unwrap(),
            &AssetsConfig::default(),
        )
    }

    fn page() -> Url {
        Url::parse("https://example.com/about/").unwrap()
    }

    fn local(s: &str) -> Rewritten {
        Rewritten::Local(s.to_string())
    }

    #[test]
    fn test_data_uri_passthrough() {
        let raw = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(
            rewriter().rewrite(raw, &page(), RefKind::Asset),
            Rewritten::Passthrough(raw.to_string())
        );
    }

    #[test]
    fn test_special_schemes_and_fragments_passthrough() {
        let r = rewriter();
        for raw in ["mailto:info@example.com", "tel:+97140000", "javascript:void(0)", "#top", ""] {
            assert_eq!(
                r.rewrite(raw, &page(), RefKind::Page),
                Rewritten::Passthrough(raw.to_string()),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_protocol_relative_origin() {
        assert_eq!(
            rewriter().rewrite(
                "//example.com/wp-content/uploads/a.png",
                &page(),
                RefKind::Asset
            ),
            local("/static/images/a.png")
        );
    }

    #[test]
    fn test_protocol_relative_remote() {
        assert_eq!(
            rewriter().rewrite("//cdn.other.net/lib.js", &page(), RefKind::Asset),
            Rewritten::Remote("https://cdn.other.net/lib.js".to_string())
        );
    }

    #[test]
    fn test_relative_forms_resolve_against_base() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("../wp-content/uploads/2024/05/logo.svg", &page(), RefKind::Asset),
            local("/static/images/2024/05/logo.svg")
        );
        assert_eq!(
            r.rewrite("./img/a.png", &page(), RefKind::Asset),
            local("/static/about/img/a.png")
        );
        assert_eq!(
            r.rewrite("img/a.png", &page(), RefKind::Asset),
            local("/static/about/img/a.png")
        );
        assert_eq!(
            r.rewrite("/wp-content/themes/t/style.css", &page(), RefKind::Asset),
            local("/static/wp-content/themes/t/style.css")
        );
    }

    #[test]
    fn test_parent_segments_clamp_at_root() {
        let home = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            rewriter().rewrite("../wp-content/uploads/2024/05/logo.svg", &home, RefKind::Asset),
            local("/static/images/2024/05/logo.svg")
        );
    }

    #[test]
    fn test_absolute_origin_strips_query_and_fragment() {
        assert_eq!(
            rewriter().rewrite(
                "https://www.example.com/wp-content/uploads/a.jpg?ver=3#x",
                &page(),
                RefKind::Asset
            ),
            local("/static/images/a.jpg")
        );
    }

    #[test]
    fn test_page_links_keep_their_path() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("https://example.com/contact/?ref=nav", &page(), RefKind::Page),
            local("/contact/")
        );
        assert_eq!(r.rewrite("../", &page(), RefKind::Page), local("/"));
        assert_eq!(
            r.rewrite("https://example.com/wp-content/uploads/brochure.pdf", &page(), RefKind::Page),
            local("/static/images/brochure.pdf")
        );
    }

    #[test]
    fn test_remote_host_left_absolute() {
        assert_eq!(
            rewriter().rewrite("https://fonts.googleapis.com/css?family=Inter", &page(), RefKind::Asset),
            Rewritten::Remote("https://fonts.googleapis.com/css?family=Inter".to_string())
        );
    }

    #[test]
    fn test_canonical_paths_unchanged() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("/static/images/2024/05/logo.svg", &page(), RefKind::Asset),
            local("/static/images/2024/05/logo.svg")
        );
        assert_eq!(
            r.rewrite("../static/css/site.css", &page(), RefKind::Asset),
            local("/static/css/site.css")
        );
    }

    #[test]
    fn test_malformed_reference_passthrough() {
        let raw = "http://[::1";
        assert_eq!(
            rewriter().rewrite(raw, &page(), RefKind::Asset),
            Rewritten::Passthrough(raw.to_string())
        );
    }

    #[test]
    fn test_rewrite_is_a_fixed_point() {
        let r = rewriter();
        let inputs = [
            "data:image/gif;base64,R0lGOD",
            "//example.com/wp-content/uploads/x.png",
            "//cdn.other.net/y.js",
            "/wp-content/plugins/p/style.css?ver=1",
            "../wp-content/uploads/2024/05/logo.svg",
            "./img/a.png",
            "img/b.png",
            "https://example.com/wp-content/uploads/c.jpg#frag",
            "https://www.example.com/services/",
            "https://other.org/z.png",
            "/static/images/d.png",
            "http://[::1",
            "mailto:a@b.co",
        ];

        for kind in [RefKind::Asset, RefKind::Page] {
            for raw in inputs {
                let once = r.rewrite(raw, &page(), kind);
                let twice = r.rewrite(once.as_str(), &page(), kind);
                assert_eq!(once.as_str(), twice.as_str(), "{} ({:?})", raw, kind);
            }
        }
    }

    #[test]
    fn test_asset_reference_pairs_remote_and_local() {
        let r = rewriter();
        let asset = r
            .asset_reference("../wp-content/uploads/2024/05/logo.svg?v=2", &page())
            .unwrap();
        assert_eq!(asset.remote_url, "https://example.com/wp-content/uploads/2024/05/logo.svg");
        assert_eq!(asset.local_path, "/static/images/2024/05/logo.svg");

        assert!(r.asset_reference("https://other.org/a.png", &page()).is_none());
        assert!(r.asset_reference("/static/images/a.png", &page()).is_none());
        assert!(r.asset_reference("/wp-content/uploads/", &page()).is_none());
        assert!(r.asset_reference("data:image/png;base64,AA", &page()).is_none());
    }

    #[test]
    fn test_unavailable_assets_stay_remote() {
        let r = rewriter();
        let unavailable: HashSet<String> = ["/static/images/missing.png".to_string()].into();

        assert_eq!(
            r.rewrite_with("/wp-content/uploads/missing.png", &page(), RefKind::Asset, &unavailable),
            Rewritten::Remote("https://example.com/wp-content/uploads/missing.png".to_string())
        );
        assert_eq!(
            r.rewrite_with("/wp-content/uploads/ok.png", &page(), RefKind::Asset, &unavailable),
            local("/static/images/ok.png")
        );
    }

    #[test]
    fn test_local_file_mapping() {
        let r = rewriter();
        let public = Path::new("/srv/public");
        assert_eq!(
            r.local_file(public, "/static/images/2024/05/logo.svg"),
            Some(PathBuf::from("/srv/public/static/images/2024/05/logo.svg"))
        );
        assert_eq!(r.local_file(public, "/static/images/"), None);
        assert_eq!(r.local_file(public, "/about/"), None);
        assert_eq!(r.local_file(public, "/static/../etc/passwd"), None);
    }
}
