//! Output module for run summaries
//!
//! This module handles:
//! - Collecting per-run counters
//! - Printing the end-of-run summary

pub mod stats;

pub use stats::{print_summary, RunSummary};
