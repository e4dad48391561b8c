//! Storage module for persisting extracted content
//!
//! This module handles all output written by a run:
//! - One JSON record per page, plus route and navigation indexes
//! - The site-wide header and footer fragments
//! - Atomic temp-file-and-rename writes
//! - The read contract used by the presentation layer

mod json;
mod traits;

pub use json::{write_atomic, JsonStore, WriteOutcome};
pub use traits::{ContentStore, StorageError, StorageResult};

