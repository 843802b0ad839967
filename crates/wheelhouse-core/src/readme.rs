//! Markdown table of the index for the repository README.

use std::collections::BTreeMap;

use regex::{NoExpand, Regex};
use wheelhouse_schema::{IndexEntry, WheelIndex, compare_dotted};

/// Marker opening the generated section.
pub const BEGIN_MARKER: &str = "<!-- BEGIN_WHEELS_SECTION -->";
/// Marker closing the generated section.
pub const END_MARKER: &str = "<!-- END_WHEELS_SECTION -->";

/// Render the index as a markdown table grouped by library.
pub fn render_wheels_table(index: &WheelIndex) -> String {
    if index.is_empty() {
        return "No wheels available yet.\n".to_string();
    }

    let mut groups: BTreeMap<&str, Vec<&IndexEntry>> = BTreeMap::new();
    for entry in index {
        groups.entry(entry.library()).or_default().push(entry);
    }

    let mut out = String::from("| Library | Python | PyTorch | CUDA | Download |\n");
    out.push_str("|---------|--------|---------|------|----------|\n");

    for (library, mut entries) in groups {
        entries.sort_by(|a, b| {
            compare_dotted(&a.python_version, &b.python_version)
                .then_with(|| compare_dotted(&a.torch_version, &b.torch_version))
                .then_with(|| compare_dotted(&a.cuda_version, &b.cuda_version))
        });
        for entry in entries {
            out.push_str(&format!(
                "| `{library}` | {} | {} | {} | [📥 {}]({}) |\n",
                entry.python_version,
                entry.torch_version,
                entry.cuda_version,
                entry.filename(),
                entry.download_link,
            ));
        }
    }

    out
}

/// Replace every marked section in `readme` with `section`.
///
/// Returns `None` when the README has no marked section.
pub fn replace_wheels_section(readme: &str, section: &str) -> Option<String> {
    let pattern = format!("(?s){}.*?{}", regex::escape(BEGIN_MARKER), regex::escape(END_MARKER));
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(readme) {
        return None;
    }
    let replacement = format!("{BEGIN_MARKER}\n{section}{END_MARKER}");
    Some(re.replace_all(readme, NoExpand(&replacement)).into_owned())
}
