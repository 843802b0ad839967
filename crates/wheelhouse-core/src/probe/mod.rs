//! Environment probe.
//!
//! Detects the local (python, torch, cuda) signature. Each axis is detected
//! on its own and any failure along the way (missing executable, timeout,
//! unset variable, unreadable file, no regex match) yields `None`; the probe
//! never returns an error.

/// CUDA version extraction.
pub mod cuda;
/// Machine access used by the detectors.
pub mod host;

pub use host::{CommandOutput, Host, SystemHost};

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use wheelhouse_schema::strip_local_version;

/// Upper bound for `nvcc --version`.
pub const NVCC_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for one interpreter query; importing torch can be slow.
pub const PYTHON_TIMEOUT: Duration = Duration::from_secs(30);

/// Interpreters tried, in order, when none is configured.
pub const DEFAULT_PYTHONS: [&str; 2] = ["python", "python3"];

const PYTHON_VERSION_SCRIPT: &str = r#"import sys; print("%d.%d.0" % sys.version_info[:2])"#;

const TORCH_SCRIPT: &str = r#"import json, torch; print(json.dumps({"version": torch.__version__, "cuda": torch.version.cuda}))"#;

/// The consumer's detected versions. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSignature {
    /// Python version, `major.minor.0`.
    pub python: Option<String>,
    /// Installed torch version without local label.
    pub torch: Option<String>,
    /// CUDA toolkit version installed on the system.
    pub system_cuda: Option<String>,
    /// CUDA version torch was built against.
    pub torch_cuda: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TorchReport {
    version: Option<String>,
    cuda: Option<String>,
}

/// Interpreter that answered the version query, with its answer.
#[derive(Debug)]
struct Interpreter {
    program: String,
    version: String,
}

/// Queries a [`Host`] for the environment signature.
///
/// Interpreter and torch queries are memoized for the lifetime of the probe,
/// so build a fresh probe per resolution.
#[derive(Debug)]
pub struct EnvironmentProbe<H: Host = SystemHost> {
    host: H,
    pythons: Vec<String>,
    interpreter: OnceCell<Option<Interpreter>>,
    torch: OnceCell<Option<TorchReport>>,
}

impl EnvironmentProbe<SystemHost> {
    /// Probe the real machine.
    pub fn new() -> Self {
        Self::with_host(SystemHost)
    }
}

impl Default for EnvironmentProbe<SystemHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> EnvironmentProbe<H> {
    /// Probe through `host`, trying the default interpreters.
    pub fn with_host(host: H) -> Self {
        Self {
            host,
            pythons: DEFAULT_PYTHONS.iter().map(ToString::to_string).collect(),
            interpreter: OnceCell::new(),
            torch: OnceCell::new(),
        }
    }

    /// Use `program` as the only interpreter candidate.
    pub fn with_python(mut self, program: impl Into<String>) -> Self {
        self.pythons = vec![program.into()];
        self
    }

    fn interpreter(&self) -> Option<&Interpreter> {
        self.interpreter
            .get_or_init(|| {
                self.pythons.iter().find_map(|program| {
                    let out =
                        self.host
                            .run(program, &["-c", PYTHON_VERSION_SCRIPT], PYTHON_TIMEOUT)?;
                    let version = out.stdout.trim();
                    if !out.success || version.is_empty() {
                        tracing::debug!("{program} did not report a version");
                        return None;
                    }
                    Some(Interpreter {
                        program: program.clone(),
                        version: version.to_string(),
                    })
                })
            })
            .as_ref()
    }

    fn torch_report(&self) -> Option<&TorchReport> {
        self.torch
            .get_or_init(|| {
                let interpreter = self.interpreter()?;
                let out = self
                    .host
                    .run(&interpreter.program, &["-c", TORCH_SCRIPT], PYTHON_TIMEOUT)?;
                if !out.success {
                    tracing::debug!("torch is not importable from {}", interpreter.program);
                    return None;
                }
                // Import hooks may print first; the report is the last line.
                let report = out.stdout.lines().rev().find(|l| !l.trim().is_empty())?;
                serde_json::from_str(report.trim())
                    .inspect_err(|e| tracing::debug!("unexpected torch report: {e}"))
                    .ok()
            })
            .as_ref()
    }

    /// The interpreter whose versions are reported, once one answered.
    pub fn python_program(&self) -> Option<&str> {
        self.interpreter().map(|i| i.program.as_str())
    }

    /// Python version of the first interpreter that answers.
    pub fn detect_python_version(&self) -> Option<String> {
        self.interpreter().map(|i| i.version.clone())
    }

    /// Installed torch version with any `+local` label removed.
    pub fn detect_torch_version(&self) -> Option<String> {
        self.torch_report()?
            .version
            .as_deref()
            .map(strip_local_version)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// CUDA version torch was compiled against; `None` for CPU builds.
    pub fn detect_torch_cuda_version(&self) -> Option<String> {
        self.torch_report()?
            .cuda
            .clone()
            .filter(|v| !v.trim().is_empty())
    }

    /// CUDA toolkit version installed on the system.
    ///
    /// Tried in order, each only if the previous gave nothing:
    /// `nvcc --version`, a version file under `CUDA_PATH`/`CUDA_HOME`, and
    /// finally the toolkit path itself when it has no version file.
    pub fn detect_system_cuda_version(&self) -> Option<String> {
        self.cuda_from_nvcc().or_else(|| self.cuda_from_toolkit_home())
    }

    fn cuda_from_nvcc(&self) -> Option<String> {
        let out = self.host.run("nvcc", &["--version"], NVCC_TIMEOUT)?;
        if !out.success {
            return None;
        }
        cuda::from_nvcc_output(&out.stdout)
    }

    fn cuda_from_toolkit_home(&self) -> Option<String> {
        let home = cuda::TOOLKIT_HOME_VARS
            .iter()
            .find_map(|key| self.host.env_var(key).filter(|v| !v.trim().is_empty()))?;

        let version_files: Vec<PathBuf> = cuda::VERSION_FILES
            .iter()
            .map(|name| Path::new(&home).join(name))
            .filter(|path| self.host.is_file(path))
            .collect();

        if version_files.is_empty() {
            return cuda::from_toolkit_path(&home);
        }

        version_files.iter().find_map(|path| {
            self.host
                .read_file(path)
                .as_deref()
                .and_then(cuda::from_version_file)
        })
    }

    /// Run every detector.
    pub fn signature(&self) -> EnvironmentSignature {
        let signature = EnvironmentSignature {
            python: self.detect_python_version(),
            torch: self.detect_torch_version(),
            system_cuda: self.detect_system_cuda_version(),
            torch_cuda: self.detect_torch_cuda_version(),
        };
        tracing::debug!("Detected {signature:?}");
        signature
    }
}
