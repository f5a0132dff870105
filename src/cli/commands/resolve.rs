//! Resolve command: configuration in, descriptor out.

use crate::bundle::{render, write_output};
use crate::cli::Args;
use crate::config::BuildConfig;
use crate::error::{CliError, Result};
use crate::pipeline::Pipeline;

/// Resolves the configured extensions and writes the descriptor.
///
/// Steps:
/// 1. Loads the build configuration (fatal if malformed)
/// 2. Applies `--manifests` and `--platform` overrides
/// 3. Runs the pipeline
/// 4. Prints `--explain` chains to stderr
/// 5. Writes the DOT graph if requested, then the descriptor
pub async fn resolve(args: &Args) -> Result<()> {
    let mut config = BuildConfig::load_from_path(&args.config)?;
    if let Some(dir) = &args.manifests {
        config.set_manifest_dir(dir);
    }

    let mut pipeline = Pipeline::new(config);
    if let Some(platform) = args.platform {
        pipeline = pipeline.platform(platform);
    }

    let output = pipeline.run()?;

    for module in args.explain_modules() {
        let chain = output
            .resolution
            .explain(&module)
            .ok_or_else(|| CliError::UnknownModule {
                module: module.to_string(),
            })?;
        let chain: Vec<&str> = chain.iter().map(|m| m.as_str()).collect();
        let excluded = if output.descriptor.hidden_imports().contains(&module) {
            ""
        } else {
            " (excluded)"
        };
        eprintln!("{}: {}{}", module, chain.join(" -> "), excluded);
    }

    if let Some(graph_path) = &args.graph {
        write_output(&output.resolution.to_dot(), Some(graph_path)).await?;
    }

    let text = render(&output.descriptor, args.format)?;
    write_output(&text, args.output.as_deref()).await
}
