//! Run statistics
//!
//! Every per-item failure during a run is logged and counted here instead of aborting,
//! so the summary is the place to see what went wrong.

use serde::Serialize;

/// Counters collected over one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Pages extracted and written (or found unchanged)
    pub pages_processed: usize,

    /// Pages that could not be fetched or written
    pub pages_failed: usize,

    /// Assets downloaded during this run
    pub assets_downloaded: usize,

    /// Assets already on disk, or claimed earlier in the run
    pub assets_skipped: usize,

    /// Assets whose download failed; their references stay remote
    pub assets_failed: usize,

    /// Empty placeholder files written for missing CSS imports
    pub css_imports_synthesized: usize,
}

impl RunSummary {
    /// Total asset references dispatched to the fetcher
    pub fn assets_total(&self) -> usize {
        self.assets_downloaded + self.assets_skipped + self.assets_failed
    }
}

/// Prints the run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The counters to display
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Pages:");
    println!("  Processed: {}", summary.pages_processed);
    println!("  Failed: {}", summary.pages_failed);
    println!();

    println!("Assets ({} references):", summary.assets_total());
    println!("  Downloaded: {}", summary.assets_downloaded);
    println!("  Skipped: {}", summary.assets_skipped);
    println!("  Failed: {}", summary.assets_failed);
    println!("  CSS imports synthesized: {}", summary.css_imports_synthesized);
    println!();

    let pages_total = summary.pages_processed + summary.pages_failed;
    let success_rate = if pages_total > 0 {
        (summary.pages_processed as f64 / pages_total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        success_rate, summary.pages_processed, pages_total
    );
}
