use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One extracted page, stored at `pages/<slug>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub slug: String,
    pub path: String,
    pub metadata: PageMetadata,
    pub navigation: Vec<NavigationItem>,
    pub content: ContentFragment,
    pub styles: PageStyles,
    pub extracted_at: DateTime<Utc>,
}

impl PageRecord {
    /// True if both records hold the same content, regardless of when they were extracted
    pub fn same_content(&self, other: &PageRecord) -> bool {
        self.slug == other.slug
            && self.path == other.path
            && self.metadata == other.metadata
            && self.navigation == other.navigation
            && self.content == other.content
            && self.styles == other.styles
    }
}

/// Document metadata from `<head>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub canonical: String,
    /// Open Graph properties keyed without the `og:` prefix
    pub og: BTreeMap<String, String>,
    /// Twitter card properties keyed without the `twitter:` prefix
    pub twitter: BTreeMap<String, String>,
    /// First JSON-LD block that parses
    pub schema: Option<serde_json::Value>,
}

/// One entry of the page-builder navigation menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub label: String,
    pub href: String,
}

/// The page's main content with header and footer removed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFragment {
    pub html: String,
    pub elementor_id: Option<String>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,
    pub links: Vec<LinkRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub tag: String,
    pub text: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub href: String,
    pub text: String,
}

/// Styles the page depends on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStyles {
    pub inline: Vec<InlineStyle>,
    pub external: Vec<ExternalStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalStyle {
    pub href: String,
    pub id: String,
}
