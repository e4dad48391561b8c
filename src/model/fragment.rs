use serde::{Deserialize, Serialize};

/// The site-wide header or footer, extracted once per run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterFragment {
    /// Outer markup of the template, references rewritten to local paths
    pub html: String,

    /// The template's scoped `<style>` block, empty if none was found
    pub inline_styles: String,

    /// Stylesheets the template depends on, in document order
    pub css_files: Vec<String>,
}
