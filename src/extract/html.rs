//! DOM serialization with reference rewriting
//!
//! Extracted markup is produced by walking the parsed tree rather than by editing
//! strings. Every URL-bearing attribute, inline `style` attribute and `<style>` body
//! is rewritten as it is written out, and the origin assets seen along the way are
//! collected so the caller can fetch them.

use crate::css::{strip_lazy_load_rules, CssAssetScanner};
use crate::model::AssetReference;
use crate::url::{PathRewriter, RefKind};
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::ElementRef;
use std::collections::HashSet;
use url::Url;

/// Class token removed from extracted markup; it hides elements until an entrance
/// animation script runs
pub const INVISIBLE_CLASS: &str = "elementor-invisible";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text is written verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "xmp", "iframe"];

/// Attributes holding a single asset URL
const ASSET_ATTRS: &[&str] = &["src", "poster", "data-src", "data-lazy-src", "data-bg"];

/// Attributes holding a `srcset` candidate list
const SRCSET_ATTRS: &[&str] = &["srcset", "data-srcset", "data-lazy-srcset"];

/// Ordered, de-duplicated set of discovered assets
#[derive(Debug, Default)]
pub struct AssetSet {
    seen: HashSet<String>,
    assets: Vec<AssetReference>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AssetReference) {
        if self.seen.insert(asset.local_path.clone()) {
            self.assets.push(asset);
        }
    }

    pub fn into_vec(self) -> Vec<AssetReference> {
        self.assets
    }
}

/// Everything needed to rewrite references found in one document
pub struct RewriteContext<'a> {
    pub rewriter: &'a PathRewriter,
    pub scanner: &'a CssAssetScanner,
    pub base: &'a Url,
    pub unavailable: &'a HashSet<String>,
}

impl<'a> RewriteContext<'a> {
    /// Rewrites one reference, recording it as an asset when it is a local file
    pub fn rewrite_url(&self, raw: &str, kind: RefKind, assets: &mut AssetSet) -> String {
        let rewritten = self
            .rewriter
            .rewrite_with(raw, self.base, kind, self.unavailable);

        if let Some(path) = rewritten.local_path() {
            if kind == RefKind::Asset || self.rewriter.is_canonical(path) {
                if let Some(asset) = self.rewriter.asset_reference(raw, self.base) {
                    assets.insert(asset);
                }
            }
        }

        rewritten.into_string()
    }

    /// Rewrites a `srcset` list, keeping each candidate's descriptor
    pub fn rewrite_srcset(&self, value: &str, assets: &mut AssetSet) -> String {
        srcset_candidates(value)
            .into_iter()
            .map(|(url, descriptor)| {
                let rewritten = self.rewrite_url(url, RefKind::Asset, assets);
                if descriptor.is_empty() {
                    rewritten
                } else {
                    format!("{} {}", rewritten, descriptor)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rewrites CSS text relative to the document, recording its assets
    pub fn rewrite_css(&self, css: &str, assets: &mut AssetSet) -> String {
        let cleaned = strip_lazy_load_rules(css);
        for asset in self.scanner.scan(&cleaned, self.base) {
            let unavailable = self.unavailable.contains(&asset.local_path);
            if !unavailable {
                assets.insert(asset);
            }
        }
        self.scanner
            .rewrite_with(&cleaned, self.base, self.unavailable)
    }
}

/// Splits a `srcset` value into `(url, descriptor)` pairs
///
/// A candidate URL runs up to the next whitespace, so commas inside it (as in
/// `data:` URIs) are kept. Its descriptor runs up to the next comma outside
/// parentheses.
fn srcset_candidates(value: &str) -> Vec<(&str, &str)> {
    let is_separator = |c: char| c.is_ascii_whitespace() || c == ',';
    let mut candidates = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(is_separator);
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let (url, tail) = rest.split_at(url_end);
        if url.ends_with(',') {
            candidates.push((url.trim_end_matches(','), ""));
            rest = tail;
            continue;
        }

        let mut depth = 0usize;
        let mut descriptor_end = tail.len();
        for (index, c) in tail.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    descriptor_end = index;
                    break;
                }
                _ => {}
            }
        }

        candidates.push((url, tail[..descriptor_end].trim()));
        rest = &tail[descriptor_end..];
    }

    candidates
}

/// Serializes an element and its subtree, skipping the nodes in `skip`
///
/// # Arguments
///
/// * `element` - Root of the subtree; written with its own tag and attributes
/// * `skip` - Descendants left out together with their subtrees
/// * `ctx` - Reference rewriting context
/// * `assets` - Receives every origin asset referenced by the written markup
pub fn serialize_element(
    element: ElementRef,
    skip: &HashSet<NodeId>,
    ctx: &RewriteContext,
    assets: &mut AssetSet,
) -> String {
    let mut output = String::new();
    write_element(element, skip, ctx, assets, &mut output);
    output
}

fn write_element(
    element: ElementRef,
    skip: &HashSet<NodeId>,
    ctx: &RewriteContext,
    assets: &mut AssetSet,
    output: &mut String,
) {
    if skip.contains(&element.id()) {
        return;
    }

    let name = element.value().name();
    output.push('<');
    output.push_str(name);

    for (attr, value) in element.value().attrs.iter() {
        let Some(value) = rewrite_attribute(name, &attr.local, value, ctx, assets) else {
            continue;
        };
        output.push(' ');
        if let Some(prefix) = &attr.prefix {
            output.push_str(prefix);
            output.push(':');
        }
        output.push_str(&attr.local);
        output.push_str("=\"");
        escape_attribute(&value, output);
        output.push('"');
    }
    output.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&name);

    for child in element.children() {
        match child.value() {
            Node::Text(text) if name == "style" => {
                output.push_str(&ctx.rewrite_css(text, assets));
            }
            Node::Text(text) if raw_text => output.push_str(text),
            Node::Text(text) => escape_text(text, output),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    write_element(child_element, skip, ctx, assets, output);
                }
            }
            Node::Comment(comment) => {
                output.push_str("<!--");
                output.push_str(comment);
                output.push_str("-->");
            }
            _ => {}
        }
    }

    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

/// Returns the value to write for an attribute, or None to drop it
fn rewrite_attribute(
    element: &str,
    attr: &str,
    value: &str,
    ctx: &RewriteContext,
    assets: &mut AssetSet,
) -> Option<String> {
    match attr {
        "class" => {
            let cleaned = clean_classes(value);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        "href" if element == "a" || element == "area" => {
            Some(ctx.rewrite_url(value, RefKind::Page, assets))
        }
        "href" => Some(ctx.rewrite_url(value, RefKind::Asset, assets)),
        "style" => Some(ctx.rewrite_css(value, assets)),
        _ if ASSET_ATTRS.contains(&attr) => Some(ctx.rewrite_url(value, RefKind::Asset, assets)),
        _ if SRCSET_ATTRS.contains(&attr) => Some(ctx.rewrite_srcset(value, assets)),
        _ => Some(value.to_string()),
    }
}

fn clean_classes(value: &str) -> String {
    value
        .split_whitespace()
        .filter(|c| *c != INVISIBLE_CLASS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_text(text: &str, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            c => output.push(c),
        }
    }
}

fn escape_attribute(value: &str, output: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            c => output.push(c),
        }
    }
}

/// Collapses runs of whitespace in element text
pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
