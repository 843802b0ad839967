//! Exact-triple resolution against the index.
//!
//! There is no range or "closest" matching: a wheel matches only when its
//! python, torch and CUDA strings are byte-equal to the query's.

use std::fmt;

use thiserror::Error;
use wheelhouse_schema::index::CompatTriple;
use wheelhouse_schema::{WheelIndex, normalize_cuda};

use crate::Reporter;
use crate::probe::EnvironmentSignature;

/// Which detector supplied the CUDA version used for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CudaSource {
    /// The toolkit installed on the system.
    System,
    /// The CUDA version torch was built against.
    Torch,
}

impl fmt::Display for CudaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system CUDA"),
            Self::Torch => write!(f, "PyTorch CUDA"),
        }
    }
}

/// System and torch disagree on the CUDA version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaDivergence {
    /// Version reported by the system toolkit.
    pub system: String,
    /// Version torch was built against.
    pub torch: String,
}

/// Outcome of the CUDA selection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaSelection {
    /// Normalized version (digits and dots only).
    pub version: String,
    /// Where it came from.
    pub source: CudaSource,
    /// Set when both sources were available and disagreed.
    pub divergence: Option<CudaDivergence>,
}

/// A resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityQuery {
    /// Library the wheel must belong to.
    pub library: String,
    /// The consumer's detected versions.
    pub signature: EnvironmentSignature,
    /// Prefer torch's CUDA version over the system toolkit's.
    pub prefer_torch_cuda: bool,
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Where to download the wheel.
    pub download_link: String,
    /// The triple that matched.
    pub triple: CompatTriple,
    /// How the CUDA version was chosen.
    pub cuda: CudaSelection,
    /// Further entries matching the same triple, ignored in favor of the first.
    pub shadowed: usize,
}

/// Fatal and negative resolution outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No Python interpreter answered.
    #[error("No Python interpreter found. Pass --python or set WHEELHOUSE_PYTHON.")]
    MissingPython,

    /// Torch is not installed, so there is no torch version to match.
    #[error("PyTorch is not installed; cannot determine the torch version to match against.")]
    MissingTorch,

    /// Neither the system nor torch reported a CUDA version.
    #[error("No CUDA version detected (neither on the system nor in PyTorch).")]
    UndetectableCuda,

    /// The index has no wheel for this library and triple.
    #[error("No wheel of '{library}' found for {triple}")]
    NoMatch {
        /// Requested library.
        library: String,
        /// The triple that was looked up.
        triple: CompatTriple,
    },
}

/// Choose the CUDA version to look up.
///
/// Torch's version wins when preferred and present; otherwise the system's;
/// otherwise torch's as a fallback.
///
/// # Errors
///
/// Returns [`ResolveError::UndetectableCuda`] when neither source has a version.
pub fn select_cuda(
    signature: &EnvironmentSignature,
    prefer_torch_cuda: bool,
) -> Result<CudaSelection, ResolveError> {
    let system = signature.system_cuda.as_deref();
    let torch = signature.torch_cuda.as_deref();

    let divergence = match (system, torch) {
        (Some(s), Some(t)) if s != t => Some(CudaDivergence {
            system: s.to_string(),
            torch: t.to_string(),
        }),
        _ => None,
    };

    let (raw, source) = match (system, torch) {
        (_, Some(t)) if prefer_torch_cuda => (t, CudaSource::Torch),
        (Some(s), _) => (s, CudaSource::System),
        (None, Some(t)) => (t, CudaSource::Torch),
        (None, None) => return Err(ResolveError::UndetectableCuda),
    };

    Ok(CudaSelection {
        version: normalize_cuda(raw),
        source,
        divergence,
    })
}

/// Resolve `query` to a download link.
///
/// Divergent CUDA sources and shadowed duplicate entries are reported as
/// warnings through `reporter`; neither stops resolution.
///
/// # Errors
///
/// Returns [`ResolveError::MissingPython`] or [`ResolveError::MissingTorch`]
/// if those versions are undetected, [`ResolveError::UndetectableCuda`] if no
/// CUDA version is available, and [`ResolveError::NoMatch`] if no entry fits.
pub fn resolve(
    query: &CompatibilityQuery,
    index: &WheelIndex,
    reporter: &dyn Reporter,
) -> Result<Resolution, ResolveError> {
    let signature = &query.signature;
    let python = signature.python.clone().ok_or(ResolveError::MissingPython)?;
    let torch = signature.torch.clone().ok_or(ResolveError::MissingTorch)?;

    let cuda = select_cuda(signature, query.prefer_torch_cuda)?;
    if let Some(d) = &cuda.divergence {
        tracing::warn!(system = %d.system, torch = %d.torch, "CUDA versions diverge");
        reporter.warning(&format!(
            "System CUDA {} differs from the CUDA PyTorch was built with ({}); using {}.",
            d.system, d.torch, cuda.source
        ));
    }

    let triple = CompatTriple {
        python,
        torch,
        cuda: cuda.version.clone(),
    };

    let mut candidates = index
        .iter()
        .filter(|entry| entry.is_library(&query.library) && entry.matches(&triple));

    let Some(first) = candidates.next() else {
        return Err(ResolveError::NoMatch {
            library: query.library.clone(),
            triple,
        });
    };

    let shadowed = candidates.count();
    if shadowed > 0 {
        tracing::warn!("{} index entries match {triple}", shadowed + 1);
        reporter.warning(&format!(
            "{} wheels match {triple}; using the first one in the index.",
            shadowed + 1
        ));
    }

    Ok(Resolution {
        download_link: first.download_link.clone(),
        triple,
        cuda,
        shadowed,
    })
}
