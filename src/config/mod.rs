//! Configuration module for Site-Distill
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_distill::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("distill.toml")).unwrap();
//! println!("Mirroring {}", config.site.origin);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetsConfig, ClassifierConfig, Config, FragmentMarker, OutputConfig, SiteConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
