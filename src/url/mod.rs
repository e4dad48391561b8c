//! URL handling module for Site-Distill
//!
//! This module provides same-site detection, canonical path rewriting for assets and
//! page links, and route derivation for page URLs.

mod domain;
mod rewrite;
mod route;

// Re-export main types and functions
pub use domain::{extract_domain, same_site};
pub use rewrite::{PathRewriter, RefKind, Rewritten};
pub use route::{normalize_route_path, PageRoute, HOME_SLUG};
