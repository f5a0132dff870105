//! Command line interface for the extension bundler.
//!
//! Parses arguments, validates them, and hands off to the resolve command.

mod args;
pub mod commands;

pub use args::Args;

use crate::error::{BundlerError, CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args).await
}

/// Runs the CLI with already-parsed arguments.
pub async fn run_with(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| BundlerError::Cli(CliError::InvalidArguments { reason }))?;

    commands::resolve(&args).await?;
    Ok(0)
}
