//! Build command

use anyhow::{Context, Result, bail};
use std::path::Path;

use wheelhouse_core::{Reporter, build_index};
use wheelhouse_schema::WheelGrammar;

use crate::ui::ConsoleReporter;

/// Index the wheel tree under `root` and write it to `output`.
pub fn build(
    root: &Path,
    output: &Path,
    repo_url: &str,
    platform: &str,
    strict: bool,
    quiet: bool,
) -> Result<()> {
    let reporter = ConsoleReporter::new(quiet);
    let grammar = WheelGrammar::new(platform);

    reporter.section(&format!("Indexing {}", root.display()));
    let (index, report) = build_index(root, repo_url, &grammar, &reporter)
        .with_context(|| format!("Failed to index {}", root.display()))?;

    if strict && !report.duplicates.is_empty() {
        bail!(
            "{} compatibility triple(s) are claimed by more than one wheel; refusing to write {}",
            report.duplicates.len(),
            output.display()
        );
    }

    index
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !report.skipped.is_empty() {
        reporter.info(&format!(
            "{} file(s) did not match the wheel naming scheme or their library directory",
            report.skipped.len()
        ));
    }
    reporter.success(&format!(
        "Index saved to {} with {} entries.",
        output.display(),
        report.indexed
    ));

    Ok(())
}
