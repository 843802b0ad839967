//! Access to the machine the probe runs on.
//!
//! Every detector goes through [`Host`] so tests can stand in a fake
//! machine: a missing `nvcc`, an unset `CUDA_PATH`, a hanging interpreter.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Exit status and standard output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Everything the command wrote to stdout.
    pub stdout: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
        }
    }

    /// A failed run that printed `stdout`.
    pub fn failed(stdout: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: stdout.into(),
        }
    }
}

/// Command runner, environment and filesystem as seen by the probe.
///
/// None of these report errors: anything that goes wrong is "no signal".
pub trait Host {
    /// Run `program` with `args`, giving up after `timeout`.
    ///
    /// Returns `None` if the program cannot be found or started, or does
    /// not finish in time.
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Option<CommandOutput>;

    /// Value of an environment variable, if set and valid unicode.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Whether `path` is an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Contents of a text file.
    fn read_file(&self, path: &Path) -> Option<String>;
}

/// The real machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Option<CommandOutput> {
        let executable = match which::which(program) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("{program} not found: {e}");
                return None;
            }
        };

        let mut child = Command::new(&executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .inspect_err(|e| tracing::debug!("failed to start {}: {e}", executable.display()))
            .ok()?;

        // Version reports are a few lines; they fit in the pipe buffer, so
        // stdout is drained after the child exits.
        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::debug!("{program} timed out after {timeout:?}");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Err(e) => {
                tracing::debug!("failed waiting for {program}: {e}");
                let _ = child.kill();
                return None;
            }
        };

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            let _ = pipe.read_to_string(&mut stdout);
        }

        Some(CommandOutput {
            success: status.success(),
            stdout,
        })
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path)
            .inspect_err(|e| tracing::debug!("failed to read {}: {e}", path.display()))
            .ok()
    }
}
