//! Site-wide header and footer extraction
//!
//! The header and footer are page-builder templates rendered into every page. They
//! are located by their [`FragmentMarker`] and extracted once per run together with
//! their scoped `<style>` block and the stylesheets they depend on.

use crate::config::FragmentMarker;
use crate::css::CssAssetScanner;
use crate::extract::html::{serialize_element, AssetSet, RewriteContext};
use crate::model::{AssetReference, HeaderFooterFragment};
use crate::url::{PathRewriter, RefKind};
use crate::{DistillError, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static STYLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("BUG: hardcoded style selector is invalid"));

static STYLESHEETS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"head link[rel="stylesheet"]"#)
        .expect("BUG: hardcoded stylesheet selector is invalid")
});

/// A header or footer fragment, the assets it references and where it was found
#[derive(Debug, Clone)]
pub struct ExtractedFragment {
    pub fragment: HeaderFooterFragment,
    pub assets: Vec<AssetReference>,
    pub source: Url,
}

/// Extracts header/footer templates from page documents
pub struct FragmentExtractor {
    rewriter: PathRewriter,
    scanner: CssAssetScanner,
}

impl FragmentExtractor {
    pub fn new(rewriter: PathRewriter) -> Self {
        Self {
            scanner: CssAssetScanner::new(rewriter.clone()),
            rewriter,
        }
    }

    /// Extracts the fragment identified by `marker` from one document
    ///
    /// Returns None if the document does not contain the marker.
    pub fn extract_fragment(
        &self,
        html: &str,
        url: &Url,
        marker: &FragmentMarker,
    ) -> Option<ExtractedFragment> {
        self.extract_fragment_with(html, url, marker, &HashSet::new())
    }

    /// Like [`extract_fragment`](Self::extract_fragment), keeping `unavailable` local
    /// paths as remote URLs
    pub fn extract_fragment_with(
        &self,
        html: &str,
        url: &Url,
        marker: &FragmentMarker,
        unavailable: &HashSet<String>,
    ) -> Option<ExtractedFragment> {
        let selector = Selector::parse(&marker.selector).ok()?;
        let doc = Html::parse_document(html);
        let root = doc.select(&selector).next()?;

        let ctx = RewriteContext {
            rewriter: &self.rewriter,
            scanner: &self.scanner,
            base: url,
            unavailable,
        };
        let mut assets = AssetSet::new();

        let markup = serialize_element(root, &HashSet::new(), &ctx, &mut assets);

        let inline_styles = doc
            .select(&STYLES)
            .map(|style| style.text().collect::<String>())
            .filter(|css| css.contains(&marker.style_marker))
            .last()
            .map(|css| ctx.rewrite_css(&css, &mut assets))
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut css_files = Vec::new();
        for link in doc.select(&STYLESHEETS) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !marker.css_files.iter().any(|name| href.contains(name.as_str())) {
                continue;
            }
            let rewritten = ctx.rewrite_url(href, RefKind::Asset, &mut assets);
            if seen.insert(rewritten.clone()) {
                css_files.push(rewritten);
            }
        }

        Some(ExtractedFragment {
            fragment: HeaderFooterFragment {
                html: markup,
                inline_styles,
                css_files,
            },
            assets: assets.into_vec(),
            source: url.clone(),
        })
    }

    /// Finds the fragment in the reference document first, then in the crawled corpus
    ///
    /// # Errors
    ///
    /// [`DistillError::FragmentNotFound`] if no document contains the marker
    pub fn locate(
        &self,
        reference: Option<(&Url, &str)>,
        corpus: &[(Url, String)],
        marker: &FragmentMarker,
    ) -> Result<ExtractedFragment> {
        if let Some((url, html)) = reference {
            if let Some(found) = self.extract_fragment(html, url, marker) {
                tracing::info!("Found {} in reference page {}", marker.name, url);
                return Ok(found);
            }
        }

        for (url, html) in corpus {
            if let Some(found) = self.extract_fragment(html, url, marker) {
                tracing::info!("Found {} in {}", marker.name, url);
                return Ok(found);
            }
        }

        Err(DistillError::FragmentNotFound {
            name: marker.name.clone(),
        })
    }
}
