//! Removal of page-builder lazy-load rules
//!
//! Elementor hides container backgrounds until a script adds `.e-lazyloaded`:
//!
//! ```css
//! .e-con.e-parent:nth-of-type(n+4):not(.e-lazyloaded):not(.e-no-lazyload),
//! .e-con.e-parent:nth-of-type(n+4):not(.e-lazyloaded):not(.e-no-lazyload) * {
//!     background-image: none !important;
//! }
//! ```
//!
//! The script is not part of the extracted page, so these rules would hide the
//! backgrounds forever.

use regex::Regex;
use std::sync::LazyLock;

static LAZY_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[^{}]*\.e-con\.e-parent[^{}]*:not\(\.e-lazyloaded\)[^{}]*\{[^}]*background-image:\s*none\s*!important[^}]*\}",
    )
    .expect("BUG: hardcoded lazy-load rule regex is invalid")
});

static EMPTY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^{};]*\{\s*\}").expect("BUG: hardcoded empty block regex is invalid")
});

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n\s*\n+").expect("BUG: hardcoded blank line regex is invalid")
});

/// Strips lazy-load background rules and the empty blocks they leave behind
pub fn strip_lazy_load_rules(css: &str) -> String {
    if !css.contains("e-lazyloaded") {
        return css.to_string();
    }

    let mut cleaned = LAZY_RULE.replace_all(css, "").into_owned();

    // Emptied media queries only show up once their inner rules are gone
    loop {
        let next = EMPTY_BLOCK.replace_all(&cleaned, "").into_owned();
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    let cleaned = BLANK_LINES.replace_all(&cleaned, "\n\n");
    cleaned
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
