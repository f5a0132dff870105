//! Command line argument parsing and validation.

use crate::bundle::OutputFormat;
use crate::extensions::{ModuleId, Platform};
use clap::Parser;
use std::path::PathBuf;

/// Extension dependency resolver for single-executable server bundles
#[derive(Parser, Debug)]
#[command(
    name = "extension_bundler",
    version,
    about = "Resolves which server extensions a bundle must embed",
    long_about = "Reads the build configuration, resolves the enabled extensions and everything they \
transitively require on the target platform, and emits the bundle descriptor for the packaging backend.

Usage:
  extension_bundler --config bundle.toml
  extension_bundler --config bundle.toml --platform windows --format toml --output build/bundle.toml
  extension_bundler --config bundle.toml --explain server.ext.gps --graph build/deps.dot

Exit code 0 = descriptor written."
)]
pub struct Args {
    /// Build configuration file
    #[arg(short, long, value_name = "PATH", env = "EXTENSION_BUNDLER_CONFIG")]
    pub config: PathBuf,

    /// Directory of `<module>.toml` manifests (overrides `bundle.manifest_dir`)
    #[arg(short, long, value_name = "DIR")]
    pub manifests: Option<PathBuf>,

    /// Target platform (defaults to the host)
    #[arg(short, long, value_enum)]
    pub platform: Option<Platform>,

    /// Descriptor format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the descriptor here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Log why a module was included (repeatable)
    #[arg(long, value_name = "MODULE")]
    pub explain: Vec<String>,

    /// Write the dependency graph in Graphviz DOT format
    #[arg(long, value_name = "PATH")]
    pub graph: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        for module in &self.explain {
            if ModuleId::parse(module.as_str()).is_err() {
                return Err(format!("Invalid module identifier for --explain: {module:?}"));
            }
        }

        if let (Some(output), Some(graph)) = (&self.output, &self.graph)
            && output == graph
        {
            return Err("--output and --graph must be different files".to_string());
        }

        Ok(())
    }

    /// Modules passed to `--explain`, parsed.
    pub fn explain_modules(&self) -> Vec<ModuleId> {
        self.explain
            .iter()
            .filter_map(|m| ModuleId::parse(m.as_str()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "extension_bundler",
            "--config",
            "bundle.toml",
            "--platform",
            "macos",
            "--format",
            "toml",
            "--explain",
            "server.ext.gps",
            "--explain",
            "core",
        ])
        .unwrap();

        assert_eq!(args.platform, Some(Platform::MacOs));
        assert_eq!(args.format, OutputFormat::Toml);
        assert_eq!(args.explain_modules().len(), 2);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_explain_target() {
        let args = Args::try_parse_from([
            "extension_bundler",
            "-c",
            "b.toml",
            "--explain",
            "a b",
        ])
        .unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn rejects_same_output_and_graph() {
        let args = Args::try_parse_from([
            "extension_bundler",
            "-c",
            "b.toml",
            "-o",
            "x.out",
            "--graph",
            "x.out",
        ])
        .unwrap();
        assert!(args.validate().is_err());
    }
}
