//! Target platforms and the per-platform extra dependency table.

use super::{ModuleId, ModuleSet};
use std::collections::BTreeMap;
use std::fmt;

/// Operating system family a bundle is built for.
///
/// Selects which rows of the [`PlatformTable`] are active during resolution.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux distributions
    Linux,
    /// macOS
    #[serde(rename = "macos")]
    #[value(name = "macos")]
    MacOs,
    /// Windows
    Windows,
    /// Anything else (BSDs, unknown targets)
    Other,
}

impl Platform {
    /// Platform of the machine running the build.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value to a platform.
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Parses a configuration key (`linux`, `macos`, `windows`, `other`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::MacOs),
            "windows" => Some(Platform::Windows),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }

    /// Lowercase name used in configuration and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra dependencies a plugin needs on a given platform.
///
/// Covers requirements a plugin manifest cannot express, such as native
/// library shims or backends that only exist on one operating system.
/// Lookups never load anything.
#[derive(Debug, Clone, Default)]
pub struct PlatformTable {
    rows: BTreeMap<ModuleId, BTreeMap<Platform, ModuleSet>>,
}

impl PlatformTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `deps` to the row for `(plugin, platform)`.
    pub fn insert<I>(&mut self, plugin: ModuleId, platform: Platform, deps: I)
    where
        I: IntoIterator<Item = ModuleId>,
    {
        self.rows
            .entry(plugin)
            .or_default()
            .entry(platform)
            .or_default()
            .extend(deps);
    }

    /// Returns the extra dependencies of `plugin` on `platform`.
    ///
    /// Empty for any pair that was never inserted.
    pub fn extra_dependencies_of(&self, plugin: &ModuleId, platform: Platform) -> ModuleSet {
        self.rows
            .get(plugin)
            .and_then(|by_platform| by_platform.get(&platform))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `(plugin, platform)` rows.
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
