//! Wheel filename grammar.
//!
//! Wheels in the repository are built against exactly one CUDA, one torch and
//! one Python version, and encode all three in their local version label and
//! ABI tags:
//!
//! ```text
//! flash_attn-2.5.8+cu121torch2.1.0-cp310-cp310-win_amd64.whl
//! └─library─┘ └ver┘  └cuda┘    └torch┘ └py┘  └py┘  └platform┘
//! ```
//!
//! Anything that does not fit the grammar exactly parses to `None`.

use crate::DEFAULT_PLATFORM_TAG;

/// Metadata recovered from a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWheel {
    /// Library identifier exactly as spelled in the filename.
    pub library: String,
    /// Public version of the wheel (everything before the `+`).
    pub wheel_version: String,
    /// CUDA toolkit version in `major.minor` form.
    pub cuda_version: String,
    /// Torch version the wheel was built against.
    pub torch_version: String,
    /// Python version in `major.minor.0` form.
    pub python_version: String,
    /// The filename this metadata was parsed from.
    pub filename: String,
}

/// The filename grammar, parameterized by the platform tag it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelGrammar {
    platform_tag: String,
}

impl Default for WheelGrammar {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM_TAG)
    }
}

impl WheelGrammar {
    /// Grammar accepting wheels for `platform_tag` (e.g. `win_amd64`).
    pub fn new(platform_tag: impl Into<String>) -> Self {
        Self {
            platform_tag: platform_tag.into(),
        }
    }

    /// The platform tag this grammar accepts.
    pub fn platform_tag(&self) -> &str {
        &self.platform_tag
    }

    /// Parse a wheel filename, returning `None` unless it matches exactly.
    pub fn parse(&self, filename: &str) -> Option<ParsedWheel> {
        let stem = filename
            .strip_suffix(".whl")?
            .strip_suffix(self.platform_tag.as_str())?
            .strip_suffix('-')?;

        // Python ABI tags: `-cp310-cp310`, both copies must agree
        let (stem, py_abi) = stem.rsplit_once("-cp")?;
        let (stem, py) = stem.rsplit_once("-cp")?;
        if !is_digits(py) || py != py_abi {
            return None;
        }
        let python_version = python_from_digits(py)?;

        let (head, local) = stem.split_once('+')?;
        let (library, wheel_version) = split_library(head)?;

        let local = local.strip_prefix("cu")?;
        let digits_end = local.find(|c: char| !c.is_ascii_digit())?;
        let (cuda_digits, rest) = local.split_at(digits_end);
        if cuda_digits.is_empty() {
            return None;
        }

        let torch_version = rest.strip_prefix("torch")?;
        if torch_version.is_empty()
            || !torch_version
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
        {
            return None;
        }

        Some(ParsedWheel {
            library: library.to_string(),
            wheel_version: wheel_version.to_string(),
            cuda_version: cuda_from_digits(cuda_digits),
            torch_version: torch_version.to_string(),
            python_version,
            filename: filename.to_string(),
        })
    }
}

/// Parse a filename with the default (`win_amd64`) grammar.
pub fn parse_wheel_filename(filename: &str) -> Option<ParsedWheel> {
    WheelGrammar::default().parse(filename)
}

/// Convert the digits after `cu` into `major.minor`.
///
/// `"121"` becomes `"12.1"`. Runs shorter than three digits are returned
/// unchanged, so `"90"` stays `"90"` rather than `"9.0"`; published indexes
/// already contain such entries and matching is byte-exact.
pub fn cuda_from_digits(digits: &str) -> String {
    if digits.len() >= 3 {
        let (major, minor) = digits.split_at(digits.len() - 1);
        format!("{major}.{minor}")
    } else {
        digits.to_string()
    }
}

/// Convert a `cp` tag's digits into `major.minor.0` (`"313"` -> `"3.13.0"`).
///
/// Assumes a single-digit major version. Returns `None` for runs shorter
/// than two digits.
pub fn python_from_digits(digits: &str) -> Option<String> {
    if digits.len() < 2 || !is_digits(digits) {
        return None;
    }
    let (major, minor) = digits.split_at(1);
    Some(format!("{major}.{minor}.0"))
}

/// Canonical library name: lower-cased, spaces replaced by `-`.
///
/// A wheel is only indexed when its parsed library equals the normalized
/// name of the directory it sits in.
pub fn normalize_library_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Library prefix of a wheel filename, split the same way the grammar does.
///
/// Works on any filename shaped `<library>-<version>...`, whatever its tags,
/// so `sage-attention-1.0+cu121...` yields `sage-attention`.
pub fn library_from_filename(filename: &str) -> Option<&str> {
    split_library(filename).map(|(library, _)| library)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_library_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Split `<library>-<version>` at the last `-` that still leaves a pure
/// library prefix and a non-empty version.
fn split_library(head: &str) -> Option<(&str, &str)> {
    let library_end = head
        .find(|c: char| !is_library_char(c))
        .unwrap_or(head.len());

    head[..library_end]
        .rmatch_indices('-')
        .map(|(i, _)| i)
        .find(|&i| i > 0 && i + 1 < head.len())
        .map(|i| (&head[..i], &head[i + 1..]))
}
