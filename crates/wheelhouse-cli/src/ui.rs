//! Terminal output.

use std::path::Path;

use crossterm::style::Stylize;
use wheelhouse_core::Reporter;

/// Prints core diagnostics to the terminal.
///
/// Warnings and skipped files go to stderr so stdout stays usable in scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            println!();
            println!("{}", title.bold());
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("   {msg}");
        }
    }

    fn success(&self, msg: &str) {
        println!("{} {msg}", "✓".green());
    }

    fn warning(&self, msg: &str) {
        eprintln!("{} {msg}", "warning:".yellow().bold());
    }

    fn skipped(&self, path: &Path, reason: &str) {
        if !self.quiet {
            eprintln!("{} {} ({reason})", "skipped".dark_grey(), path.display());
        }
    }
}

/// Left-aligned label/value line, as used in detection summaries.
pub fn field(label: &str, value: Option<&str>, missing: &str) {
    let lw = 14;
    match value {
        Some(v) => println!("   {label:<lw$}{v}"),
        None => println!("   {label:<lw$}{}", missing.dark_grey()),
    }
}
