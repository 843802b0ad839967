//! Find command

use anyhow::Result;
use std::path::Path;

use wheelhouse_core::resolver::ResolveError;
use wheelhouse_core::{CompatibilityQuery, EnvironmentProbe, Reporter, resolve};
use wheelhouse_schema::WheelIndex;

use crate::ui::{ConsoleReporter, field};

/// Detect the local environment and print the matching wheel's link.
pub fn find(
    library: &str,
    index_path: &Path,
    use_torch_cuda: bool,
    python: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let reporter = ConsoleReporter::new(quiet);
    let index = WheelIndex::load(index_path)?;
    tracing::debug!("Loaded {} entries from {}", index.len(), index_path.display());

    let probe = match python {
        Some(program) => EnvironmentProbe::new().with_python(program),
        None => EnvironmentProbe::new(),
    };
    let signature = probe.signature();

    if !quiet {
        reporter.section("Detected");
        field("Python", signature.python.as_deref(), "not found");
        field("PyTorch", signature.torch.as_deref(), "not installed");
        field("System CUDA", signature.system_cuda.as_deref(), "not detected");
        field("PyTorch CUDA", signature.torch_cuda.as_deref(), "not available");
        println!();
    }

    let query = CompatibilityQuery {
        library: library.to_string(),
        signature,
        prefer_torch_cuda: use_torch_cuda,
    };

    match resolve(&query, &index, &reporter) {
        Ok(resolution) => {
            reporter.info(&format!(
                "Using {} {}",
                resolution.cuda.source, resolution.cuda.version
            ));
            reporter.success("Compatible wheel found:");
            println!("{}", resolution.download_link);
            Ok(())
        }
        Err(e @ ResolveError::NoMatch { .. }) => {
            reporter.info("Check whether the repository has a build for this combination.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
