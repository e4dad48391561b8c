//! Extraction module: turns parsed page documents into content records
//!
//! This module contains:
//! - DOM serialization with reference rewriting
//! - Header/content/footer classification of page sections
//! - Page extraction (content, metadata, navigation, styles)
//! - Header and footer template extraction

mod classifier;
mod fragment;
mod html;
mod metadata;
mod page;

pub use classifier::{
    BoilerplateClassifier, Classification, Region, Signal, FOOTER_CONTENT_LIMIT,
    HEADER_CONTENT_LIMIT, MIN_SIGNALS,
};
pub use fragment::{ExtractedFragment, FragmentExtractor};
pub use html::{serialize_element, AssetSet, RewriteContext};
pub use metadata::{extract_metadata, extract_navigation, extract_styles};
pub use page::{ExtractedPage, PageExtractor};
