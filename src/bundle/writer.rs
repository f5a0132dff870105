//! Descriptor serialization and output.
//!
//! The packaging backend reads the descriptor from a file or a pipe; this
//! module renders it and writes it out, creating parent directories as needed.

use super::BundleDescriptor;
use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Serialization format for the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// TOML
    Toml,
}

/// Renders `descriptor` in `format`, always ending with a newline.
pub fn render(descriptor: &BundleDescriptor, format: OutputFormat) -> Result<String> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(descriptor)?,
        OutputFormat::Toml => toml::to_string_pretty(descriptor)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Writes `contents` to `destination`, or to stdout when it is `None`.
///
/// Parent directories of `destination` are created if missing.
pub async fn write_output(contents: &str, destination: Option<&Path>) -> Result<()> {
    match destination {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, contents).await?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(contents.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
