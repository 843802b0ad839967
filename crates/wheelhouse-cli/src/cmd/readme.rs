//! Readme command

use anyhow::{Context, Result};
use std::path::Path;

use wheelhouse_core::Reporter;
use wheelhouse_core::readme::{BEGIN_MARKER, END_MARKER, render_wheels_table, replace_wheels_section};
use wheelhouse_schema::WheelIndex;

use crate::ui::ConsoleReporter;

/// Rewrite the wheels section of `readme` from the index at `wheels`.
pub fn readme(readme: &Path, wheels: &Path, quiet: bool) -> Result<()> {
    let reporter = ConsoleReporter::new(quiet);

    let index = WheelIndex::load(wheels)?;
    let content = std::fs::read_to_string(readme)
        .with_context(|| format!("Failed to read {}", readme.display()))?;

    let section = render_wheels_table(&index);
    let Some(updated) = replace_wheels_section(&content, &section) else {
        reporter.warning(&format!(
            "{} has no {BEGIN_MARKER} ... {END_MARKER} section; nothing to update",
            readme.display()
        ));
        return Ok(());
    };

    if updated != content {
        std::fs::write(readme, updated)
            .with_context(|| format!("Failed to write {}", readme.display()))?;
    }
    reporter.success(&format!(
        "{} updated from {}",
        readme.display(),
        wheels.display()
    ));

    Ok(())
}
