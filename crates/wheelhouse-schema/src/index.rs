//! The persisted compatibility index (`wheels.json`).
//!
//! The wire format is a JSON array of objects with exactly four keys:
//!
//! ```json
//! [{"cuda-version":"12.1","torch-version":"2.1.0","python-version":"3.10.0","download-link":"..."}]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RAW_PATH_SEGMENT;
use crate::wheel::{library_from_filename, normalize_library_name};

/// Errors that can occur when loading or saving a [`WheelIndex`].
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The index file does not exist.
    #[error("index file {} not found; run `wheelhouse build` first", .0.display())]
    NotFound(PathBuf),

    /// The index file exists but could not be read or written.
    #[error("failed to access index file {}: {source}", path.display())]
    Io {
        /// Path of the index file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The index file is not a valid JSON index.
    #[error("malformed index: {0}")]
    Json(#[from] serde_json::Error),
}

/// The (python, torch, cuda) combination a wheel was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompatTriple {
    /// Python version, `major.minor.0`.
    pub python: String,
    /// Torch version without local label.
    pub torch: String,
    /// CUDA version, `major.minor`.
    pub cuda: String,
}

impl fmt::Display for CompatTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Python={}, Torch={}, CUDA={}",
            self.python, self.torch, self.cuda
        )
    }
}

/// One wheel in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// CUDA version the wheel was built against.
    #[serde(rename = "cuda-version")]
    pub cuda_version: String,

    /// Torch version the wheel was built against.
    #[serde(rename = "torch-version")]
    pub torch_version: String,

    /// Python version the wheel was built for.
    #[serde(rename = "python-version")]
    pub python_version: String,

    /// Where the wheel can be downloaded from.
    #[serde(rename = "download-link")]
    pub download_link: String,
}

impl IndexEntry {
    /// Whether this entry was built for exactly `triple` (byte equality).
    pub fn matches(&self, triple: &CompatTriple) -> bool {
        self.python_version == triple.python
            && self.torch_version == triple.torch
            && self.cuda_version == triple.cuda
    }

    /// The entry's compatibility triple.
    pub fn triple(&self) -> CompatTriple {
        CompatTriple {
            python: self.python_version.clone(),
            torch: self.torch_version.clone(),
            cuda: self.cuda_version.clone(),
        }
    }

    /// The wheel's filename (last segment of the download link).
    pub fn filename(&self) -> &str {
        self.download_link
            .rsplit('/')
            .next()
            .unwrap_or(&self.download_link)
    }

    /// Library directory this wheel was indexed from.
    ///
    /// The wire format has no library field, so this reads the first path
    /// segment after `raw/main/`. Links without that segment (mirrors,
    /// hand-edited indexes) fall back to the filename's library prefix.
    pub fn library(&self) -> &str {
        let marker = format!("/{RAW_PATH_SEGMENT}/");
        let from_path = self
            .download_link
            .split_once(marker.as_str())
            .and_then(|(_, rel)| rel.split_once('/'))
            .map(|(library, _)| library)
            .filter(|library| !library.is_empty());
        if let Some(library) = from_path {
            return library;
        }
        let filename = self.filename();
        library_from_filename(filename).unwrap_or(filename)
    }

    /// Whether this entry belongs to `library` after name normalization.
    pub fn is_library(&self, library: &str) -> bool {
        normalize_library_name(self.library()) == normalize_library_name(library)
    }
}

/// Ordered list of index entries, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WheelIndex {
    entries: Vec<IndexEntry>,
}

impl WheelIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries that are already in their final order.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Entries in index order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Iterate over entries in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON (two-space indent, trailing newline).
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, IndexError> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Load an index from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the file does not exist,
    /// [`IndexError::Io`] if it cannot be read and [`IndexError::Json`] if
    /// it is not a valid index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let data = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                IndexError::NotFound(path.to_path_buf())
            } else {
                IndexError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the index to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<'a> IntoIterator for &'a WheelIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
