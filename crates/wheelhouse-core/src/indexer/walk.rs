//! Wheel tree traversal.
//!
//! The repository is laid out as `<root>/<library>/<version>/<wheel>.whl`.
//! Only that depth is visited; loose files at the first two levels are
//! ignored.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A `.whl` file found two levels below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFile {
    /// Name of the first-level (library) directory, as on disk.
    pub library_dir: String,
    /// Filename of the wheel.
    pub filename: String,
    /// Absolute or root-joined path to the wheel.
    pub path: PathBuf,
    /// Path relative to the root, always `/`-separated.
    pub relative: String,
}

/// Collect every wheel in `<root>/<library>/<version>/`.
///
/// Unreadable library or version directories are logged and skipped; the
/// order of the result follows the filesystem and carries no meaning.
///
/// # Errors
///
/// Returns an error if `root` itself cannot be read.
pub fn walk_wheel_tree(root: &Path) -> Result<Vec<WheelFile>> {
    let mut wheels = Vec::new();

    let libraries = fs::read_dir(root)
        .with_context(|| format!("Failed to read wheel directory {}", root.display()))?;

    for library in subdirectories(libraries) {
        let library_dir = library
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let buckets = match fs::read_dir(&library) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory {}: {e}", library.display());
                continue;
            }
        };

        for bucket in subdirectories(buckets) {
            let bucket_name = bucket
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let files = match fs::read_dir(&bucket) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {e}", bucket.display());
                    continue;
                }
            };

            for path in files.filter_map(std::result::Result::ok).map(|e| e.path()) {
                if !path.is_file() || path.extension().is_none_or(|ext| ext != "whl") {
                    continue;
                }
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                wheels.push(WheelFile {
                    relative: format!("{library_dir}/{bucket_name}/{filename}"),
                    library_dir: library_dir.clone(),
                    filename,
                    path,
                });
            }
        }
    }

    tracing::debug!("Found {} wheel files under {}", wheels.len(), root.display());
    Ok(wheels)
}

fn subdirectories(entries: fs::ReadDir) -> impl Iterator<Item = PathBuf> {
    entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
}
