//! Header/content/footer classification of page sections
//!
//! Page-builder pages often repeat the site header and footer inside the page body.
//! Each top-level child of the content wrapper is scored against header signals
//! (logo, navigation menu, call-to-action button) and footer signals (contact phrase,
//! email, phone, address, copyright, social links) and assigned a [`Region`].

use crate::config::{ClassifierConfig, FragmentMarker};
use crate::extract::html::element_text;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Positive signals needed before a section counts as boilerplate
pub const MIN_SIGNALS: usize = 2;

/// A header-leaning section with more content elements than this is kept
pub const HEADER_CONTENT_LIMIT: usize = 2;

/// A footer-leaning section with more content elements than this is kept
pub const FOOTER_CONTENT_LIMIT: usize = 3;

static LOGO: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".elementor-widget-theme-site-logo, .elementor-widget-image[data-id*="logo"]"#)
        .expect("BUG: hardcoded logo selector is invalid")
});

static NAV_MENU: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".elementor-widget-nav-menu, .elementor-nav-menu")
        .expect("BUG: hardcoded nav menu selector is invalid")
});

static BUTTON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".elementor-widget-button").expect("BUG: hardcoded button selector is invalid")
});

static CONTENT_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, p").expect("BUG: hardcoded content selector is invalid")
});

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded anchor selector is invalid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("BUG: hardcoded email regex is invalid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+\d[\d\s-]{6,}").expect("BUG: hardcoded phone regex is invalid")
});

static COPYRIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"©\s*\d{4}|copyright").expect("BUG: hardcoded copyright regex is invalid")
});

const CONTACT_PHRASES: &[&str] = &["contact us", "let's build together"];
const HEADER_BUTTON_PHRASES: &[&str] = &["lets talk", "let's talk", "contact"];

/// Where a section of the page belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Header,
    Content,
    Footer,
}

/// Evidence recorded while classifying a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Matches the configured header or footer template selector
    Marker,
    /// Is a `<header>` or `<footer>` element
    Landmark,
    Logo,
    NavMenu,
    HeaderButton,
    ContactPhrase,
    Email,
    Phone,
    Address,
    Copyright,
    SocialLinks,
}

impl Signal {
    fn leans_header(self) -> bool {
        matches!(self, Self::Logo | Self::NavMenu | Self::HeaderButton)
    }
}

/// The region assigned to a section and the signals behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub region: Region,
    pub signals: Vec<Signal>,
}

impl Classification {
    pub fn is_content(&self) -> bool {
        self.region == Region::Content
    }
}

/// Decides whether page sections are content or repeated header/footer boilerplate
pub struct BoilerplateClassifier {
    header_marker: Selector,
    footer_marker: Selector,
    address_keywords: Vec<String>,
    social_domains: Vec<String>,
}

impl BoilerplateClassifier {
    /// Creates a classifier from the site vocabulary and the fragment markers
    pub fn new(
        config: &ClassifierConfig,
        header: &FragmentMarker,
        footer: &FragmentMarker,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            header_marker: parse_marker(header)?,
            footer_marker: parse_marker(footer)?,
            address_keywords: config
                .address_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            social_domains: config
                .social_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        })
    }

    /// Classifies one section of the page
    ///
    /// # Decision
    ///
    /// 1. A section containing the header/footer template marker, or a `<header>`/
    ///    `<footer>` element, is assigned directly
    /// 2. Fewer than [`MIN_SIGNALS`] positive signals: content
    /// 3. Otherwise the section leans header when header signals are at least as many
    ///    as footer signals, footer otherwise
    /// 4. A leaning section with substantial content (more `h1, h2, h3, p` elements
    ///    than the lean's limit) stays content
    pub fn classify(&self, element: ElementRef) -> Classification {
        if let Some(region) = self.direct_region(element) {
            let signal = if matches!(element.value().name(), "header" | "footer") {
                Signal::Landmark
            } else {
                Signal::Marker
            };
            return Classification {
                region,
                signals: vec![signal],
            };
        }

        let signals = self.signals(element);

        if signals.len() < MIN_SIGNALS {
            return Classification {
                region: Region::Content,
                signals,
            };
        }

        let header_votes = signals.iter().filter(|s| s.leans_header()).count();
        let footer_votes = signals.len() - header_votes;

        let (lean, limit) = if header_votes >= footer_votes {
            (Region::Header, HEADER_CONTENT_LIMIT)
        } else {
            (Region::Footer, FOOTER_CONTENT_LIMIT)
        };

        let content_elements = element.select(&CONTENT_ELEMENTS).count();
        let region = if content_elements > limit {
            Region::Content
        } else {
            lean
        };

        Classification { region, signals }
    }

    /// Classifies each top-level element child of the content wrapper
    pub fn classify_children<'a>(
        &self,
        wrapper: ElementRef<'a>,
    ) -> Vec<(ElementRef<'a>, Classification)> {
        wrapper
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| {
                let classification = self.classify(child);
                if !classification.is_content() {
                    tracing::debug!(
                        "Excluding {:?} section <{}> ({:?})",
                        classification.region,
                        child.value().name(),
                        classification.signals
                    );
                }
                (child, classification)
            })
            .collect()
    }

    fn direct_region(&self, element: ElementRef) -> Option<Region> {
        match element.value().name() {
            "header" => return Some(Region::Header),
            "footer" => return Some(Region::Footer),
            _ => {}
        }

        let contains = |marker: &Selector| {
            marker.matches(&element) || element.select(marker).next().is_some()
        };

        if contains(&self.header_marker) {
            Some(Region::Header)
        } else if contains(&self.footer_marker) {
            Some(Region::Footer)
        } else {
            None
        }
    }

    fn signals(&self, element: ElementRef) -> Vec<Signal> {
        let text = element_text(element).to_lowercase();
        let mut signals = Vec::new();

        if element.select(&LOGO).next().is_some() {
            signals.push(Signal::Logo);
        }
        if element.select(&NAV_MENU).next().is_some() {
            signals.push(Signal::NavMenu);
        }
        if element.select(&BUTTON).next().is_some()
            && HEADER_BUTTON_PHRASES.iter().any(|p| text.contains(p))
        {
            signals.push(Signal::HeaderButton);
        }

        if CONTACT_PHRASES.iter().any(|p| text.contains(p)) {
            signals.push(Signal::ContactPhrase);
        }
        if EMAIL.is_match(&text) {
            signals.push(Signal::Email);
        }
        if PHONE.is_match(&text) {
            signals.push(Signal::Phone);
        }
        if self.address_keywords.iter().any(|k| text.contains(k.as_str())) {
            signals.push(Signal::Address);
        }
        if COPYRIGHT.is_match(&text) {
            signals.push(Signal::Copyright);
        }
        if self.has_social_links(element) {
            signals.push(Signal::SocialLinks);
        }

        signals
    }

    fn has_social_links(&self, element: ElementRef) -> bool {
        element.select(&ANCHORS).any(|a| {
            let href = a.value().attr("href").unwrap_or_default().to_lowercase();
            self.social_domains.iter().any(|d| href.contains(d.as_str()))
        })
    }
}

fn parse_marker(marker: &FragmentMarker) -> Result<Selector, ConfigError> {
    Selector::parse(&marker.selector).map_err(|e| {
        ConfigError::InvalidSelector(format!(
            "{} selector '{}': {:?}",
            marker.name, marker.selector, e
        ))
    })
}
