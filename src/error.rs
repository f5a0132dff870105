//! Error types for bundler operations.
//!
//! Only fatal conditions live here. A module that cannot be loaded is not an
//! error; see [`crate::extensions::RegistryError`] for how that degrades.

use crate::extensions::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Build configuration errors (fatal, reported before resolution starts)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Malformed or unreadable build configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A configured path could not be made absolute
    #[error("failed to resolve path {}: {source}", path.display())]
    ResolvePath {
        /// Path being resolved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or does not match the schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is missing or empty
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dotted field name, e.g. `bundle.entry_point`
        field: String,
    },

    /// An identifier in the configuration is not a valid module identifier
    #[error("invalid module identifier {value:?} in `{field}`")]
    InvalidModuleId {
        /// Field the identifier came from
        field: String,
        /// Offending value
        value: String,
    },

    /// An inline manifest whose `id` differs from the module it is keyed on
    #[error("manifest for {module} declares id {declared:?}")]
    ManifestIdMismatch {
        /// Module the manifest is keyed on
        module: String,
        /// Identifier stated in the manifest
        declared: String,
    },

    /// An inline manifest with an invalid dependency list
    #[error("invalid inline manifest: {0}")]
    Manifest(#[from] RegistryError),

    /// A dependency row or manifest for a module whose dependencies are never
    /// looked up
    #[error("`{field}` names {value}, which is outside plugin namespace {namespace}")]
    OutsidePluginNamespace {
        /// Field the module came from
        field: String,
        /// Offending module
        value: String,
        /// Configured plugin namespace
        namespace: String,
    },

    /// A platform key that is not one of the supported platform names
    #[error("unknown platform {value:?} in `{field}`")]
    UnknownPlatform {
        /// Field the key came from
        field: String,
        /// Offending value
        value: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A module passed to `--explain` was not part of the resolved set
    #[error("Module {module} was not resolved; nothing to explain")]
    UnknownModule {
        /// Module identifier
        module: String,
    },
}
