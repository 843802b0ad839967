//! wheelhouse - CUDA/PyTorch wheel index CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wheelhouse_cli::cmd;
use wheelhouse_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Build {
            root,
            output,
            repo_url,
            platform,
            strict,
        } => cmd::build::build(&root, &output, &repo_url, &platform, strict, quiet),
        Commands::Find {
            library,
            index,
            use_torch_cuda,
            python,
        } => cmd::find::find(&library, &index, use_torch_cuda, python.as_deref(), quiet),
        Commands::Readme { readme, wheels } => cmd::readme::readme(&readme, &wheels, quiet),
    }
}
