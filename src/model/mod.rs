//! Content model written by the pipeline and read back by the site
//!
//! Every type serializes in camelCase so the JSON documents match what the
//! front end consumes.

mod asset;
mod fragment;
mod page;
mod routes;

pub use asset::AssetReference;
pub use fragment::HeaderFooterFragment;
pub use page::{
    ContentFragment, ExternalStyle, Heading, ImageRef, InlineStyle, LinkRef, NavigationItem,
    PageMetadata, PageRecord, PageStyles,
};
pub use routes::{NavigationIndex, Route, RouteIndex};
