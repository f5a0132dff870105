//! Serde layout of the build configuration file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::extensions::ExtensionManifest;

/// Small helper for serde defaults.
fn bool_true() -> bool {
    true
}

/// On-disk layout of the build configuration.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub bundle: Option<BundleSection>,

    #[serde(default)]
    pub extensions: ExtensionsSection,

    /// plugin id -> platform key -> extra module ids
    #[serde(default)]
    pub platform_dependencies: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// module id -> inline manifest
    #[serde(default)]
    pub manifests: BTreeMap<String, ExtensionManifest>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BundleSection {
    #[serde(default)]
    pub entry_point: Option<PathBuf>,

    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// e.g. "server.ext"; empty means every module is plugin-class
    #[serde(default)]
    pub plugin_namespace: String,

    #[serde(default)]
    pub always_included: Vec<String>,

    #[serde(default)]
    pub excludes: Vec<String>,

    #[serde(default)]
    pub manifest_dir: Option<PathBuf>,
}

/// Enabled plugins, either as an ordered list of names or as a table of
/// per-plugin options keyed by name.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum ExtensionsSection {
    List(Vec<String>),
    Table(BTreeMap<String, ExtensionOptions>),
}

impl Default for ExtensionsSection {
    fn default() -> Self {
        ExtensionsSection::List(Vec::new())
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ExtensionOptions {
    #[serde(default = "bool_true")]
    pub enabled: bool,

    /// Plugin-specific settings; the server reads these, the bundler does not.
    #[allow(dead_code)]
    #[serde(flatten)]
    pub settings: BTreeMap<String, toml::Value>,
}

impl ExtensionsSection {
    /// Names of enabled plugins in configuration order.
    pub fn enabled(self) -> Vec<String> {
        match self {
            ExtensionsSection::List(names) => names,
            ExtensionsSection::Table(table) => table
                .into_iter()
                .filter(|(_, opts)| opts.enabled)
                .map(|(name, _)| name)
                .collect(),
        }
    }
}
