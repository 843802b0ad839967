/// Wheel tree traversal.
pub mod walk;

pub use walk::{WheelFile, walk_wheel_tree};

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use wheelhouse_schema::index::CompatTriple;
use wheelhouse_schema::{
    IndexEntry, RAW_PATH_SEGMENT, WheelGrammar, WheelIndex, compare_dotted, normalize_library_name,
};

use crate::Reporter;

/// Why a wheel was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The filename does not fit the wheel grammar.
    Unparseable,
    /// The filename names a different library than its directory.
    LibraryMismatch {
        /// Normalized name of the containing library directory.
        expected: String,
        /// Library parsed from the filename.
        found: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable => write!(f, "filename does not match the wheel naming scheme"),
            Self::LibraryMismatch { expected, found } => {
                write!(f, "library '{found}' does not match directory '{expected}'")
            }
        }
    }
}

/// A wheel file that was not indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedWheel {
    /// Path of the wheel on disk.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Several wheels of one library built for the same triple.
///
/// The resolver takes the first one in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTriple {
    /// Normalized library name.
    pub library: String,
    /// The shared triple.
    pub triple: CompatTriple,
    /// Download links of all wheels sharing it, in index order.
    pub links: Vec<String>,
}

/// Diagnostics gathered while building an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of wheels that made it into the index.
    pub indexed: usize,
    /// Wheels left out, sorted by path.
    pub skipped: Vec<SkippedWheel>,
    /// Triples that more than one wheel of the same library claims.
    pub duplicates: Vec<DuplicateTriple>,
}

/// Trim whitespace and trailing slashes from a repository URL.
///
/// # Errors
///
/// Returns an error if nothing is left after trimming.
pub fn normalize_repo_url(url: &str) -> Result<&str> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("Repository URL is empty");
    }
    Ok(trimmed)
}

/// Download link for a wheel at `relative` (a `/`-separated path).
pub fn download_link(repo_url: &str, relative: &str) -> String {
    format!("{repo_url}/{RAW_PATH_SEGMENT}/{relative}")
}

/// Build the compatibility index for the wheel tree under `root`.
///
/// Wheels are accepted when their filename parses under `grammar` and names
/// the library of the directory they live in. The returned index is sorted
/// by (library, python, torch, cuda, link) so rebuilding an unchanged tree
/// produces identical output whatever order the filesystem lists it in.
///
/// # Errors
///
/// Returns an error if `repo_url` is empty or `root` cannot be read.
pub fn build_index(
    root: &Path,
    repo_url: &str,
    grammar: &WheelGrammar,
    reporter: &dyn Reporter,
) -> Result<(WheelIndex, BuildReport)> {
    let repo_url = normalize_repo_url(repo_url)?;
    let mut report = BuildReport::default();
    let mut accepted: Vec<(String, IndexEntry)> = Vec::new();

    for wheel in walk_wheel_tree(root)? {
        let expected = normalize_library_name(&wheel.library_dir);

        let reason = match grammar.parse(&wheel.filename) {
            Some(parsed) if parsed.library == expected => {
                accepted.push((
                    expected,
                    IndexEntry {
                        cuda_version: parsed.cuda_version,
                        torch_version: parsed.torch_version,
                        python_version: parsed.python_version,
                        download_link: download_link(repo_url, &wheel.relative),
                    },
                ));
                continue;
            }
            Some(parsed) => SkipReason::LibraryMismatch {
                expected,
                found: parsed.library,
            },
            None => SkipReason::Unparseable,
        };

        report.skipped.push(SkippedWheel {
            path: wheel.path,
            reason,
        });
    }

    accepted.sort_by(|(lib_a, a), (lib_b, b)| lib_a.cmp(lib_b).then_with(|| entry_order(a, b)));
    report.skipped.sort_by(|a, b| a.path.cmp(&b.path));

    for skipped in &report.skipped {
        tracing::debug!("Skipped {}: {}", skipped.path.display(), skipped.reason);
        reporter.skipped(&skipped.path, &skipped.reason.to_string());
    }

    report.duplicates = find_duplicates(&accepted);
    for dup in &report.duplicates {
        reporter.warning(&format!(
            "{} wheels of '{}' share {}; the first one wins",
            dup.links.len(),
            dup.library,
            dup.triple
        ));
    }

    report.indexed = accepted.len();
    let entries = accepted.into_iter().map(|(_, entry)| entry).collect();
    Ok((WheelIndex::from_entries(entries), report))
}

fn entry_order(a: &IndexEntry, b: &IndexEntry) -> Ordering {
    compare_dotted(&a.python_version, &b.python_version)
        .then_with(|| compare_dotted(&a.torch_version, &b.torch_version))
        .then_with(|| compare_dotted(&a.cuda_version, &b.cuda_version))
        .then_with(|| a.download_link.cmp(&b.download_link))
}

/// Equal (library, triple) pairs are adjacent once sorted.
fn find_duplicates(sorted: &[(String, IndexEntry)]) -> Vec<DuplicateTriple> {
    let mut duplicates: Vec<DuplicateTriple> = Vec::new();

    for pair in sorted.windows(2) {
        let [(lib_a, a), (lib_b, b)] = pair else {
            continue;
        };
        if lib_a != lib_b || a.triple() != b.triple() {
            continue;
        }
        match duplicates.last_mut() {
            Some(last) if last.library == *lib_a && a.matches(&last.triple) => {
                last.links.push(b.download_link.clone());
            }
            _ => duplicates.push(DuplicateTriple {
                library: lib_a.clone(),
                triple: a.triple(),
                links: vec![a.download_link.clone(), b.download_link.clone()],
            }),
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::reporter::RecordingReporter;
    use std::fs;

    const TV: &str = "torchvision-0.16.0+cu121torch2.1.0-cp310-cp310-win_amd64.whl";

    fn touch(root: &Path, library: &str, bucket: &str, filename: &str) {
        let dir = root.join(library).join(bucket);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(filename), b"").unwrap();
    }

    fn build(root: &Path, url: &str) -> (WheelIndex, BuildReport) {
        build_index(root, url, &WheelGrammar::default(), &NullReporter).unwrap()
    }

    #[test]
    fn test_torchvision_scenario() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "torchvision", "0.16.0", TV);

        let (index, report) = build(dir.path(), "https://example.com/repo");
        assert_eq!(report.indexed, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(
            index.entries(),
            &[IndexEntry {
                cuda_version: "12.1".to_string(),
                torch_version: "2.1.0".to_string(),
                python_version: "3.10.0".to_string(),
                download_link: format!(
                    "https://example.com/repo/raw/main/torchvision/0.16.0/{TV}"
                ),
            }]
        );
    }

    #[test]
    fn test_entry_order_with_long_torch_versions() {
        let entry = |torch: &str| IndexEntry {
            cuda_version: "12.1".to_string(),
            torch_version: torch.to_string(),
            python_version: "3.10.0".to_string(),
            download_link: format!("https://x/raw/main/lib/1/lib-1+cu121torch{torch}.whl"),
        };
        let torches = ["2", "10", "15000000000000000000000"];

        let mut forward: Vec<IndexEntry> = torches.iter().map(|t| entry(t)).collect();
        let mut backward: Vec<IndexEntry> = torches.iter().rev().map(|t| entry(t)).collect();
        forward.sort_by(entry_order);
        backward.sort_by(entry_order);

        assert_eq!(forward, backward);
        let sorted: Vec<_> = forward.iter().map(|e| e.torch_version.as_str()).collect();
        assert_eq!(sorted, torches);
    }

    #[test]
    fn test_repo_url_trimming() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "torchvision", "0.16.0", TV);

        let (index, _) = build(dir.path(), " https://example.com/repo// ");
        assert!(
            index.entries()[0]
                .download_link
                .starts_with("https://example.com/repo/raw/main/")
        );

        assert!(normalize_repo_url("").is_err());
        assert!(normalize_repo_url(" / ").is_err());
        assert!(
            build_index(dir.path(), "/", &WheelGrammar::default(), &NullReporter).is_err()
        );
    }

    #[test]
    fn test_skipped_wheels_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "torchvision", "0.16.0", TV);
        touch(dir.path(), "torchvision", "0.16.0", "torchvision-0.16.0-py3-none-any.whl");
        touch(
            dir.path(),
            "torchaudio",
            "2.1.0",
            "torchvision-0.16.0+cu121torch2.1.0-cp311-cp311-win_amd64.whl",
        );

        let reporter = RecordingReporter::default();
        let (index, report) =
            build_index(dir.path(), "https://x", &WheelGrammar::default(), &reporter).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::LibraryMismatch {
                expected: "torchaudio".to_string(),
                found: "torchvision".to_string(),
            }
        );
        assert_eq!(report.skipped[1].reason, SkipReason::Unparseable);
        assert_eq!(reporter.skipped.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_library_directory_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "Flash Attn",
            "2.5.8",
            "flash-attn-2.5.8+cu121torch2.1.0-cp310-cp310-win_amd64.whl",
        );
        // Upper-case filenames never match a lower-cased directory.
        touch(
            dir.path(),
            "xformers",
            "0.0.23",
            "Xformers-0.0.23+cu121torch2.1.0-cp310-cp310-win_amd64.whl",
        );

        let (index, report) = build(dir.path(), "https://x");
        assert_eq!(index.len(), 1);
        assert!(index.entries()[0].download_link.contains("/Flash Attn/2.5.8/"));
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_output_order_is_independent_of_creation_order() {
        let wheels = [
            ("torchvision", "0.16.0", TV),
            (
                "torchvision",
                "0.16.0",
                "torchvision-0.16.0+cu118torch2.1.0-cp39-cp39-win_amd64.whl",
            ),
            (
                "flash_attn",
                "2.5.8",
                "flash_attn-2.5.8+cu124torch2.4.0-cp312-cp312-win_amd64.whl",
            ),
            (
                "flash_attn",
                "2.6.0",
                "flash_attn-2.6.0+cu124torch2.4.0-cp310-cp310-win_amd64.whl",
            ),
        ];

        let forward = tempfile::tempdir().unwrap();
        for (lib, bucket, name) in wheels {
            touch(forward.path(), lib, bucket, name);
        }
        let backward = tempfile::tempdir().unwrap();
        for (lib, bucket, name) in wheels.iter().rev() {
            touch(backward.path(), lib, bucket, name);
        }

        let (a, _) = build(forward.path(), "https://x");
        let (b, _) = build(backward.path(), "https://x");
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());

        let order: Vec<_> = a.iter().map(IndexEntry::filename).collect();
        assert_eq!(
            order,
            [
                "flash_attn-2.6.0+cu124torch2.4.0-cp310-cp310-win_amd64.whl",
                "flash_attn-2.5.8+cu124torch2.4.0-cp312-cp312-win_amd64.whl",
                "torchvision-0.16.0+cu118torch2.1.0-cp39-cp39-win_amd64.whl",
                TV,
            ]
        );
    }

    #[test]
    fn test_duplicate_triples_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "torchvision", "0.16.0", TV);
        touch(
            dir.path(),
            "torchvision",
            "0.16.0-rebuild",
            "torchvision-0.16.0.post1+cu121torch2.1.0-cp310-cp310-win_amd64.whl",
        );
        // Same triple, different library: not a duplicate.
        touch(
            dir.path(),
            "torchaudio",
            "2.1.0",
            "torchaudio-2.1.0+cu121torch2.1.0-cp310-cp310-win_amd64.whl",
        );

        let reporter = RecordingReporter::default();
        let (index, report) =
            build_index(dir.path(), "https://x", &WheelGrammar::default(), &reporter).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(report.duplicates.len(), 1);
        let dup = &report.duplicates[0];
        assert_eq!(dup.library, "torchvision");
        assert_eq!(dup.links.len(), 2);
        // Links order lexically: '-' sorts before '/'.
        assert!(dup.links[0].contains("/0.16.0-rebuild/"));
        assert!(dup.links[1].contains("/0.16.0/"));
        assert_eq!(reporter.warnings.lock().unwrap().len(), 1);
    }
}
