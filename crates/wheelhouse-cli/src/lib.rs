//! wheelhouse - index and locate prebuilt CUDA/PyTorch wheels
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Wheels compiled against a specific Python, PyTorch and CUDA version are
//! kept in a plain directory tree and published from a git repository.
//! `wheelhouse build` turns that tree into `wheels.json`; `wheelhouse find`
//! detects the local environment and prints the one wheel built for it.
//!
//! # Repository Layout
//!
//! ```text
//! <root>/
//! ├── torchvision/
//! │   └── 0.16.0/
//! │       └── torchvision-0.16.0+cu121torch2.1.0-cp310-cp310-win_amd64.whl
//! └── flash_attn/
//!     └── 2.5.8/
//!         └── flash_attn-2.5.8+cu121torch2.1.0-cp311-cp311-win_amd64.whl
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wheelhouse_schema::{DEFAULT_INDEX_FILE, DEFAULT_PLATFORM_TAG};

#[derive(Debug, Parser)]
#[command(name = "wheelhouse")]
#[command(author, version, about = "wheelhouse - index and locate CUDA/PyTorch wheels")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the wheel index from a directory tree
    Build {
        /// Root directory of the local wheel repository
        root: PathBuf,
        /// Where to write the index
        #[arg(long, short, default_value = DEFAULT_INDEX_FILE)]
        output: PathBuf,
        /// Public URL of the repository (e.g. https://github.com/user/repo)
        #[arg(long, env = "WHEELHOUSE_REPO_URL")]
        repo_url: String,
        /// Platform tag the wheels must carry
        #[arg(long, env = "WHEELHOUSE_PLATFORM", default_value = DEFAULT_PLATFORM_TAG)]
        platform: String,
        /// Fail when several wheels of a library share a compatibility triple
        #[arg(long)]
        strict: bool,
    },
    /// Find the wheel matching this machine's Python, PyTorch and CUDA
    Find {
        /// Library to look for
        library: String,
        /// Index file produced by `wheelhouse build`
        #[arg(long, env = "WHEELHOUSE_INDEX", default_value = DEFAULT_INDEX_FILE)]
        index: PathBuf,
        /// Match against the CUDA version PyTorch was built with instead of the system's
        #[arg(long)]
        use_torch_cuda: bool,
        /// Python interpreter to inspect (defaults to `python`, then `python3`)
        #[arg(long, env = "WHEELHOUSE_PYTHON")]
        python: Option<String>,
    },
    /// Regenerate the wheels table in a README
    Readme {
        /// README to update in place
        #[arg(long, default_value = "README.md")]
        readme: PathBuf,
        /// Index file to render
        #[arg(long, default_value = DEFAULT_INDEX_FILE)]
        wheels: PathBuf,
    },
}
