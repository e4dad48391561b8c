//! Discovery and rewriting of `url(...)` and `@import` references in CSS
//!
//! A single tokenizing pass finds every reference. References always resolve against
//! the URL of the stylesheet that contains them, which for inline styles is the page.

use crate::model::AssetReference;
use crate::url::{PathRewriter, RefKind, Rewritten};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

/// `url("...")`, `url('...')`, `url(...)` or `@import "..."` / `@import '...'`
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'"\)\s]*))\s*\)|@import\s+(?:"([^"]+)"|'([^']+)')"#,
    )
    .expect("BUG: hardcoded CSS reference regex is invalid")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?(?:"([^"]+)"|'([^']+)'|([^'"\)\s;]+))"#)
        .expect("BUG: hardcoded CSS import regex is invalid")
});

/// Placeholder body written for an imported stylesheet that could not be fetched
pub fn import_placeholder(local_path: &str) -> String {
    format!("/* Empty placeholder for missing CSS import: {} */\n", local_path)
}

/// Finds and rewrites asset references inside CSS text
#[derive(Debug, Clone)]
pub struct CssAssetScanner {
    rewriter: PathRewriter,
}

/// One reference found by the tokenizer
struct Token<'a> {
    raw: &'a str,
    quote: &'static str,
    import: bool,
}

impl<'a> Token<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let (group, quote, import) = if let Some(m) = caps.get(1) {
            (m, "\"", false)
        } else if let Some(m) = caps.get(2) {
            (m, "'", false)
        } else if let Some(m) = caps.get(3) {
            (m, "", false)
        } else if let Some(m) = caps.get(4) {
            (m, "\"", true)
        } else {
            (caps.get(5)?, "'", true)
        };

        Some(Self {
            raw: group.as_str(),
            quote,
            import,
        })
    }

    fn render(&self, value: &str) -> String {
        if self.import {
            format!("@import {q}{}{q}", value, q = self.quote)
        } else {
            format!("url({q}{}{q})", value, q = self.quote)
        }
    }
}

impl CssAssetScanner {
    pub fn new(rewriter: PathRewriter) -> Self {
        Self { rewriter }
    }

    /// Lists the origin assets a stylesheet references, in order of first appearance
    ///
    /// # Arguments
    ///
    /// * `css` - Stylesheet text
    /// * `css_url` - Absolute URL of the stylesheet (the page URL for inline styles)
    pub fn scan(&self, css: &str, css_url: &Url) -> Vec<AssetReference> {
        let mut seen = HashSet::new();

        REFERENCE
            .captures_iter(css)
            .filter_map(|caps| Token::from_captures(&caps).map(|t| t.raw.to_string()))
            .filter_map(|raw| self.rewriter.asset_reference(&raw, css_url))
            .filter(|asset| seen.insert(asset.local_path.clone()))
            .collect()
    }

    /// Rewrites every reference to its canonical form
    pub fn rewrite(&self, css: &str, css_url: &Url) -> String {
        self.rewrite_with(css, css_url, &HashSet::new())
    }

    /// Rewrites every reference, leaving `unavailable` local targets as remote URLs
    ///
    /// Passthrough references (data URIs, fragments, empty `url()`) keep their exact
    /// original text.
    pub fn rewrite_with(&self, css: &str, css_url: &Url, unavailable: &HashSet<String>) -> String {
        REFERENCE
            .replace_all(css, |caps: &Captures| {
                let Some(token) = Token::from_captures(caps) else {
                    return caps[0].to_string();
                };

                match self
                    .rewriter
                    .rewrite_with(token.raw, css_url, RefKind::Asset, unavailable)
                {
                    Rewritten::Passthrough(_) => caps[0].to_string(),
                    rewritten => token.render(rewritten.as_str()),
                }
            })
            .into_owned()
    }

    /// Lists the origin stylesheets pulled in with `@import`
    pub fn imports(&self, css: &str, css_url: &Url) -> Vec<AssetReference> {
        let mut seen = HashSet::new();

        IMPORT
            .captures_iter(css)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
            .filter_map(|m| self.rewriter.asset_reference(m.as_str(), css_url))
            .filter(|asset| seen.insert(asset.local_path.clone()))
            .collect()
    }

    /// Writes a placeholder for every imported local `.css` file missing on disk
    ///
    /// # Returns
    ///
    /// The number of placeholders written
    pub async fn ensure_imports(
        &self,
        public_dir: &Path,
        css: &str,
        css_url: &Url,
    ) -> std::io::Result<usize> {
        let mut written = 0;

        for import in self.imports(css, css_url) {
            if !import.local_path.to_ascii_lowercase().ends_with(".css") {
                continue;
            }

            let Some(target) = self.rewriter.local_file(public_dir, &import.local_path) else {
                continue;
            };

            if tokio::fs::try_exists(&target).await? {
                continue;
            }

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, import_placeholder(&import.local_path)).await?;
            tracing::info!("Synthesized placeholder for missing import {}", import.local_path);
            written += 1;
        }

        Ok(written)
    }
}
