//! Extension Bundler - resolves the server extensions a bundle must embed.
//!
//! This binary reads the build configuration, computes the transitive closure
//! of the enabled extensions, and writes the descriptor consumed by the
//! packaging backend.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match extension_bundler::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
