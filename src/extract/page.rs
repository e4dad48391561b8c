//! Page extraction: one parsed document in, one [`PageRecord`] out
//!
//! The content wrapper is located, its top-level sections are classified, and only
//! the content sections are serialized with every reference rewritten. Metadata,
//! navigation and styles come from the whole document.

use crate::config::Config;
use crate::css::CssAssetScanner;
use crate::extract::classifier::BoilerplateClassifier;
use crate::extract::html::{element_text, serialize_element, AssetSet, RewriteContext};
use crate::extract::metadata::{extract_metadata, extract_navigation, extract_styles};
use crate::model::{
    AssetReference, ContentFragment, Heading, ImageRef, LinkRef, PageRecord,
};
use crate::url::{PageRoute, PathRewriter, RefKind};
use crate::ConfigError;
use chrono::Utc;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Content wrapper candidates, in lookup order
static WRAPPERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"[data-elementor-type="wp-page"]"#,
        r#"[data-elementor-type="wp-post"][data-elementor-post-type="post"]"#,
        "main",
        ".page-content",
        "#content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded wrapper selector is invalid"))
    .collect()
});

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BUG: hardcoded body selector is invalid"));

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("BUG: hardcoded heading selector is invalid")
});

static PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("BUG: hardcoded paragraph selector is invalid"));

static IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("BUG: hardcoded image selector is invalid"));

static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: hardcoded link selector is invalid"));

/// Body children never treated as content when the body itself is the wrapper
const BODY_EXCLUDED: &[&str] = &["header", "footer", "script", "style"];

/// Paragraphs this short or shorter are left out of the paragraph extract
const MIN_PARAGRAPH_CHARS: usize = 20;

/// A page record and the origin assets it references
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub record: PageRecord,
    pub assets: Vec<AssetReference>,
}

/// Turns page documents into page records
pub struct PageExtractor {
    rewriter: PathRewriter,
    scanner: CssAssetScanner,
    classifier: BoilerplateClassifier,
}

impl PageExtractor {
    pub fn new(config: &Config, rewriter: PathRewriter) -> Result<Self, ConfigError> {
        Ok(Self {
            scanner: CssAssetScanner::new(rewriter.clone()),
            classifier: BoilerplateClassifier::new(
                &config.classifier,
                &config.header,
                &config.footer,
            )?,
            rewriter,
        })
    }

    /// Extracts a page with every origin asset rewritten to its local path
    pub fn extract(&self, html: &str, page_url: &Url) -> ExtractedPage {
        self.extract_with(html, page_url, &HashSet::new())
    }

    /// Extracts a page, keeping the `unavailable` local paths as remote URLs
    ///
    /// # Arguments
    ///
    /// * `html` - Source document
    /// * `page_url` - URL the document was fetched from; relative references resolve against it
    /// * `unavailable` - Local asset paths whose download failed
    pub fn extract_with(
        &self,
        html: &str,
        page_url: &Url,
        unavailable: &HashSet<String>,
    ) -> ExtractedPage {
        let doc = Html::parse_document(html);
        let route = PageRoute::from_url(page_url);
        let ctx = RewriteContext {
            rewriter: &self.rewriter,
            scanner: &self.scanner,
            base: page_url,
            unavailable,
        };
        let mut assets = AssetSet::new();

        let metadata = extract_metadata(&doc, &ctx, &mut assets);
        let navigation = extract_navigation(&doc, &ctx, &mut assets);
        let content = self.extract_content(&doc, &ctx, &mut assets);
        let styles = extract_styles(&doc, &ctx, &mut assets);

        ExtractedPage {
            record: PageRecord {
                slug: route.slug,
                path: route.path,
                metadata,
                navigation,
                content,
                styles,
                extracted_at: Utc::now(),
            },
            assets: assets.into_vec(),
        }
    }

    fn extract_content(
        &self,
        doc: &Html,
        ctx: &RewriteContext,
        assets: &mut AssetSet,
    ) -> ContentFragment {
        if let Some(wrapper) = find_wrapper(doc) {
            let mut skip = HashSet::new();
            let mut kept = Vec::new();

            for (child, classification) in self.classifier.classify_children(wrapper) {
                if classification.is_content() {
                    kept.push(child);
                } else {
                    skip.insert(child.id());
                }
            }

            let mut content = self.auxiliary_extracts(&kept, ctx);
            content.html = serialize_element(wrapper, &skip, ctx, assets);
            content.elementor_id = wrapper.value().attr("data-elementor-id").map(str::to_string);
            return content;
        }

        // No dedicated wrapper: the body's own children, minus landmarks and scripts
        let Some(body) = doc.select(&BODY).next() else {
            return ContentFragment::default();
        };

        let kept: Vec<ElementRef> = body
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| !BODY_EXCLUDED.contains(&child.value().name()))
            .filter(|child| self.classifier.classify(*child).is_content())
            .collect();

        let skip: HashSet<NodeId> = HashSet::new();
        let mut content = self.auxiliary_extracts(&kept, ctx);
        content.html = kept
            .iter()
            .map(|child| serialize_element(*child, &skip, ctx, assets))
            .collect();
        content
    }

    /// Headings, paragraphs, images and links of the kept sections
    fn auxiliary_extracts(&self, kept: &[ElementRef], ctx: &RewriteContext) -> ContentFragment {
        // The element markup already records these assets
        let mut discard = AssetSet::new();
        let mut content = ContentFragment::default();

        for section in kept {
            for heading in select_within(section, &HEADINGS) {
                let text = element_text(heading);
                if text.is_empty() {
                    continue;
                }
                let tag = heading.value().name().to_string();
                content.headings.push(Heading {
                    level: tag[1..].parse().unwrap_or(1),
                    tag,
                    text,
                    id: heading.value().attr("id").map(str::to_string),
                });
            }

            for paragraph in select_within(section, &PARAGRAPHS) {
                let text = element_text(paragraph);
                if text.chars().count() > MIN_PARAGRAPH_CHARS {
                    content.paragraphs.push(text);
                }
            }

            for image in select_within(section, &IMAGES) {
                let Some(src) = image.value().attr("src").map(str::trim) else {
                    continue;
                };
                if src.is_empty() || src.starts_with("data:") {
                    continue;
                }
                content.images.push(ImageRef {
                    src: ctx.rewrite_url(src, RefKind::Asset, &mut discard),
                    alt: image.value().attr("alt").unwrap_or_default().to_string(),
                    width: parse_dimension(image.value().attr("width")),
                    height: parse_dimension(image.value().attr("height")),
                });
            }

            for link in select_within(section, &LINKS) {
                let href = link.value().attr("href").unwrap_or_default().trim();
                if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                    continue;
                }
                let text = element_text(link);
                content.links.push(LinkRef {
                    href: ctx.rewrite_url(href, RefKind::Page, &mut discard),
                    text: if text.is_empty() { href.to_string() } else { text },
                });
            }
        }

        content
    }
}

/// Finds the content wrapper, trying each candidate selector in turn
fn find_wrapper(doc: &Html) -> Option<ElementRef<'_>> {
    WRAPPERS
        .iter()
        .find_map(|selector| doc.select(selector).next())
}

/// Elements matching `selector` in a section, the section itself included
fn select_within<'a>(
    section: &ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::once(*section)
        .filter(move |element| selector.matches(element))
        .chain(section.select(selector))
}

/// Parses a `width`/`height` attribute, accepting a trailing `px`
fn parse_dimension(value: Option<&str>) -> Option<u32> {
    value?.trim().trim_end_matches("px").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AssetsConfig, ClassifierConfig, FragmentMarker, OutputConfig, SiteConfig, UserAgentConfig,
    };

    fn config() -> Config {
        Config {
            site: SiteConfig {
                origin: "https://example.com".to_string(),
                sitemaps: vec!["https://example.com/page-sitemap.xml".to_string()],
                reference_page: None,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                data_dir: "./data".to_string(),
                public_dir: "./public".to_string(),
            },
            assets: AssetsConfig::default(),
            classifier: ClassifierConfig::default(),
            header: FragmentMarker::default_header(),
            footer: FragmentMarker::default_footer(),
        }
    }

    fn extractor() -> PageExtractor {
        let rewriter = PathRewriter::new(
            Url::parse("https://example.com").unwrap(),
            &AssetsConfig::default(),
        );
        PageExtractor::new(&config(), rewriter).unwrap()
    }

    const ABOUT: &str = r##"<!DOCTYPE html><html><head><title>About</title></head><body>
<div data-elementor-type="wp-post" data-elementor-id="3080" class="elementor elementor-3080">
  <div class="elementor-widget-theme-site-logo"><img src="../wp-content/uploads/2024/05/logo.svg"></div>
  <nav class="elementor-nav-menu"><a class="elementor-item" href="../">Home</a></nav>
</div>
<div data-elementor-type="wp-page" data-elementor-id="42" class="elementor elementor-42">
  <div class="e-con hero-header"><div class="elementor-widget-theme-site-logo"><img src="/wp-content/uploads/logo.svg"></div><div class="elementor-widget-nav-menu"></div></div>
  <section class="e-con elementor-invisible"><h1 id="top">About the team</h1>
    <p>We build careful websites for careful people.</p>
    <p>Short one.</p>
    <img src="../wp-content/uploads/2024/05/team.jpg" alt="Team" width="640" height="480px">
    <a href="../contact/">Talk to us</a><a href="#top">Top</a><a href="javascript:void(0)">x</a>
  </section>
  <div class="e-con"><span>info@example.com</span><span>© 2024 Example</span></div>
</div>
<div data-elementor-type="wp-post" data-elementor-id="3084"><p>contact us</p></div>
</body></html>"##;

    #[test]
    fn test_extract_keeps_only_content_sections() {
        let page_url = Url::parse("https://example.com/about/").unwrap();
        let extracted = extractor().extract(ABOUT, &page_url);
        let record = &extracted.record;

        assert_eq!(record.slug, "about");
        assert_eq!(record.path, "/about");
        assert_eq!(record.content.elementor_id.as_deref(), Some("42"));

        let html = &record.content.html;
        assert!(html.starts_with(
            r#"<div data-elementor-type="wp-page" data-elementor-id="42" class="elementor elementor-42">"#
        ));
        assert!(html.contains(r#"<section class="e-con"><h1 id="top">About the team</h1>"#));
        assert!(html.contains(r#"src="/static/images/2024/05/team.jpg""#));
        assert!(html.contains(r#"href="/contact/""#));
        assert!(!html.contains("hero-header"));
        assert!(!html.contains("info@example.com"));
        assert!(!html.contains("elementor-invisible"));
        assert!(!html.contains("https://example.com"));
    }

    #[test]
    fn test_auxiliary_extracts_from_kept_sections() {
        let page_url = Url::parse("https://example.com/about/").unwrap();
        let content = extractor().extract(ABOUT, &page_url).record.content;

        assert_eq!(
            content.headings,
            vec![Heading {
                level: 1,
                tag: "h1".to_string(),
                text: "About the team".to_string(),
                id: Some("top".to_string()),
            }]
        );
        assert_eq!(
            content.paragraphs,
            vec!["We build careful websites for careful people."]
        );
        assert_eq!(
            content.images,
            vec![ImageRef {
                src: "/static/images/2024/05/team.jpg".to_string(),
                alt: "Team".to_string(),
                width: Some(640),
                height: Some(480),
            }]
        );
        assert_eq!(
            content.links,
            vec![LinkRef {
                href: "/contact/".to_string(),
                text: "Talk to us".to_string(),
            }]
        );
    }

    #[test]
    fn test_assets_cover_whole_document() {
        let page_url = Url::parse("https://example.com/about/").unwrap();
        let extracted = extractor().extract(ABOUT, &page_url);
        let locals: Vec<_> = extracted.assets.iter().map(|a| a.local_path.as_str()).collect();

        assert_eq!(locals, vec!["/static/images/2024/05/team.jpg"]);
    }

    #[test]
    fn test_failed_asset_rendered_remote() {
        let page_url = Url::parse("https://example.com/about/").unwrap();
        let unavailable: HashSet<String> = ["/static/images/2024/05/team.jpg".to_string()].into();
        let extracted = extractor().extract_with(ABOUT, &page_url, &unavailable);

        assert!(extracted
            .record
            .content
            .html
            .contains(r#"src="https://example.com/wp-content/uploads/2024/05/team.jpg""#));
        assert!(extracted.assets.is_empty());
    }

    #[test]
    fn test_fallback_wrappers_and_body() {
        let page_url = Url::parse("https://example.com/").unwrap();

        let main = extractor().extract(
            "<body><main><p>Plain main content, written directly.</p></main></body>",
            &page_url,
        );
        assert_eq!(main.record.slug, "home");
        assert_eq!(
            main.record.content.html,
            "<main><p>Plain main content, written directly.</p></main>"
        );
        assert_eq!(main.record.content.elementor_id, None);
        assert_eq!(
            main.record.content.paragraphs,
            vec!["Plain main content, written directly."]
        );

        let body = extractor().extract(
            "<body><header>h</header><div><p>Body text</p></div><script>x()</script><footer>f</footer></body>",
            &page_url,
        );
        assert_eq!(body.record.content.html, "<div><p>Body text</p></div>");
    }

    #[test]
    fn test_empty_document_yields_empty_content() {
        let page_url = Url::parse("https://example.com/empty/").unwrap();
        let extracted = extractor().extract("", &page_url);
        assert_eq!(extracted.record.slug, "empty");
        assert!(extracted.record.content.html.is_empty());
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension(Some("640")), Some(640));
        assert_eq!(parse_dimension(Some(" 480px ")), Some(480));
        assert_eq!(parse_dimension(Some("auto")), None);
        assert_eq!(parse_dimension(None), None);
    }
}
