//! Document-wide extracts: metadata, navigation and styles
//!
//! These come from the whole document rather than the content wrapper, so they are
//! unaffected by boilerplate removal.

use crate::extract::html::{element_text, AssetSet, RewriteContext};
use crate::model::{ExternalStyle, InlineStyle, NavigationItem, PageMetadata, PageStyles};
use crate::url::RefKind;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("BUG: hardcoded title selector is invalid"));

static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#)
        .expect("BUG: hardcoded description selector is invalid")
});

static CANONICAL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel="canonical"]"#).expect("BUG: hardcoded canonical selector is invalid")
});

static OPEN_GRAPH: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property^="og:"]"#).expect("BUG: hardcoded og selector is invalid")
});

static TWITTER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name^="twitter:"]"#).expect("BUG: hardcoded twitter selector is invalid")
});

static JSON_LD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("BUG: hardcoded JSON-LD selector is invalid")
});

static NAV_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".elementor-nav-menu a.elementor-item")
        .expect("BUG: hardcoded nav item selector is invalid")
});

static HEAD_STYLES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("head style").expect("BUG: hardcoded head style selector is invalid")
});

static BODY_STYLES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body style").expect("BUG: hardcoded body style selector is invalid")
});

static STYLESHEETS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"head link[rel="stylesheet"]"#)
        .expect("BUG: hardcoded stylesheet selector is invalid")
});

/// Open Graph and Twitter properties that name an image
const IMAGE_PROPERTIES: &[&str] = &["image", "image:url", "image:secure_url", "image:src"];

/// Extracts title, description, canonical, social cards and JSON-LD
///
/// Image properties on the origin are rewritten to local paths and recorded as assets.
pub fn extract_metadata(doc: &Html, ctx: &RewriteContext, assets: &mut AssetSet) -> PageMetadata {
    let mut metadata = PageMetadata {
        title: doc
            .select(&TITLE)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        description: doc
            .select(&DESCRIPTION)
            .next()
            .and_then(|m| m.value().attr("content"))
            .unwrap_or_default()
            .to_string(),
        canonical: doc
            .select(&CANONICAL)
            .next()
            .and_then(|l| l.value().attr("href"))
            .unwrap_or_default()
            .to_string(),
        ..Default::default()
    };

    for meta in doc.select(&OPEN_GRAPH) {
        let (Some(property), Some(content)) = (meta.value().attr("property"), meta.value().attr("content")) else {
            continue;
        };
        let key = property.trim_start_matches("og:").to_string();
        let value = social_value(&key, content, ctx, assets);
        metadata.og.entry(key).or_insert(value);
    }

    for meta in doc.select(&TWITTER) {
        let (Some(name), Some(content)) = (meta.value().attr("name"), meta.value().attr("content")) else {
            continue;
        };
        let key = name.trim_start_matches("twitter:").to_string();
        let value = social_value(&key, content, ctx, assets);
        metadata.twitter.entry(key).or_insert(value);
    }

    for script in doc.select(&JSON_LD) {
        let text: String = script.text().collect();
        match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(schema) => {
                metadata.schema = Some(schema);
                break;
            }
            Err(e) => tracing::warn!("Skipping unparseable JSON-LD block: {}", e),
        }
    }

    metadata
}

fn social_value(key: &str, content: &str, ctx: &RewriteContext, assets: &mut AssetSet) -> String {
    if IMAGE_PROPERTIES.contains(&key) {
        ctx.rewrite_url(content, RefKind::Asset, assets)
    } else {
        content.to_string()
    }
}

/// Extracts the page-builder navigation menu, hrefs rewritten as page links
pub fn extract_navigation(doc: &Html, ctx: &RewriteContext, assets: &mut AssetSet) -> Vec<NavigationItem> {
    doc.select(&NAV_ITEMS)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            let label = element_text(a);
            if href.is_empty() || label.is_empty() {
                return None;
            }
            Some(NavigationItem {
                label,
                href: ctx.rewrite_url(href, RefKind::Page, assets),
            })
        })
        .collect()
}

/// Extracts inline `<style>` blocks and head stylesheets
///
/// Head styles keep their `id`; body styles are numbered `body-style-<n>` in document
/// order. Inline CSS is cleaned of lazy-load rules and rewritten; stylesheet hrefs are
/// rewritten and recorded as assets.
pub fn extract_styles(doc: &Html, ctx: &RewriteContext, assets: &mut AssetSet) -> PageStyles {
    let mut styles = PageStyles::default();

    for style in doc.select(&HEAD_STYLES) {
        let content: String = style.text().collect();
        if content.trim().is_empty() {
            continue;
        }
        styles.inline.push(InlineStyle {
            id: style.value().attr("id").unwrap_or_default().to_string(),
            content: ctx.rewrite_css(&content, assets),
        });
    }

    for (i, style) in doc.select(&BODY_STYLES).enumerate() {
        let content: String = style.text().collect();
        if content.trim().is_empty() {
            continue;
        }
        styles.inline.push(InlineStyle {
            id: format!("body-style-{}", i),
            content: ctx.rewrite_css(&content, assets),
        });
    }

    for link in doc.select(&STYLESHEETS) {
        let Some(href) = link.value().attr("href").filter(|h| !h.trim().is_empty()) else {
            continue;
        };
        styles.external.push(ExternalStyle {
            href: ctx.rewrite_url(href, RefKind::Asset, assets),
            id: link.value().attr("id").unwrap_or_default().to_string(),
        });
    }

    styles
}
