//! Build-time extension dependency resolver
//!
//! This library decides which optional server extensions a single-executable
//! bundle must embed:
//! - the extensions enabled by the default configuration
//! - the base modules that are always required
//! - everything those transitively depend on for the target platform
//!
//! The result is a [`bundle::BundleDescriptor`] for the packaging backend.
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod extensions;
pub mod pipeline;

// Re-export commonly used types
pub use error::{BundlerError, CliError, ConfigError, Result};
