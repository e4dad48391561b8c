//! CSS handling: reference discovery, canonical rewriting and lazy-load cleanup

mod lazyload;
mod scanner;

pub use lazyload::strip_lazy_load_rules;
pub use scanner::{import_placeholder, CssAssetScanner};
