//! Bundle descriptor and the emitter that produces it.

use crate::error::{ConfigError, Result};
use crate::extensions::{ModuleId, ModuleSet, Platform};
use std::path::{Path, PathBuf};

/// Everything the packaging backend needs to know about what to embed.
///
/// Constructed once by [`emit`] or [`DescriptorBuilder`] and never mutated
/// afterwards. Inclusions and exclusions are sorted lexicographically so the
/// serialized form is reproducible.
///
/// # Examples
///
/// ```
/// use extension_bundler::bundle::emit;
/// use extension_bundler::extensions::{ModuleId, ModuleSet};
///
/// let resolved: ModuleSet = ["ext.b", "ext.a", "tkinter"]
///     .into_iter()
///     .map(|s| ModuleId::parse(s).unwrap())
///     .collect();
/// let excluded = ModuleSet::from([ModuleId::parse("tkinter").unwrap()]);
///
/// let descriptor = emit(&resolved, &excluded, "main.py", ["src"]);
/// let hidden: Vec<_> = descriptor.hidden_imports().iter().map(|m| m.as_str()).collect();
/// assert_eq!(hidden, ["ext.a", "ext.b"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BundleDescriptor {
    /// Entry point script.
    entry_point: PathBuf,

    /// Directories searched for modules.
    search_paths: Vec<PathBuf>,

    /// Modules the backend cannot see statically and must embed.
    hidden_imports: Vec<ModuleId>,

    /// Modules the backend must leave out.
    excludes: Vec<ModuleId>,

    /// Platform the inclusions were resolved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<Platform>,
}

impl BundleDescriptor {
    /// Returns the entry point script.
    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }

    /// Returns the module search paths.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Returns the sorted inclusions.
    pub fn hidden_imports(&self) -> &[ModuleId] {
        &self.hidden_imports
    }

    /// Returns the sorted exclusions.
    pub fn excludes(&self) -> &[ModuleId] {
        &self.excludes
    }

    /// Returns the platform the descriptor was resolved for.
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }
}

/// Builds a descriptor from a resolved module set.
///
/// Pure: subtracts `exclusions` from `resolved`, sorts, assembles the record.
pub fn emit<E, S, P>(
    resolved: &ModuleSet,
    exclusions: &ModuleSet,
    entry_point: E,
    search_paths: S,
) -> BundleDescriptor
where
    E: AsRef<Path>,
    S: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    BundleDescriptor {
        entry_point: entry_point.as_ref().to_path_buf(),
        search_paths: search_paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect(),
        // ModuleSet iterates in lexicographic order
        hidden_imports: resolved.difference(exclusions).cloned().collect(),
        excludes: exclusions.iter().cloned().collect(),
        platform: None,
    }
}

/// Builder for constructing [`BundleDescriptor`].
///
/// # Examples
///
/// ```
/// use extension_bundler::bundle::DescriptorBuilder;
/// use extension_bundler::extensions::{ModuleId, ModuleSet, Platform};
///
/// # fn example() -> extension_bundler::Result<()> {
/// let descriptor = DescriptorBuilder::new()
///     .entry_point("src/server/__main__.py")
///     .search_paths(["src"])
///     .resolved(ModuleSet::from([ModuleId::parse("server.ext.gps").unwrap()]))
///     .platform(Platform::Linux)
///     .build()?;
/// assert_eq!(descriptor.platform(), Some(Platform::Linux));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Default)]
pub struct DescriptorBuilder {
    entry_point: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    resolved: ModuleSet,
    exclusions: ModuleSet,
    platform: Option<Platform>,
}

impl DescriptorBuilder {
    /// Creates a new descriptor builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the entry point script.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn entry_point<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.entry_point = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the module search paths.
    ///
    /// # Required
    ///
    /// At least one search path is required for building.
    pub fn search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        self
    }

    /// Sets the resolved module set.
    ///
    /// Default: empty
    pub fn resolved(mut self, modules: ModuleSet) -> Self {
        self.resolved = modules;
        self
    }

    /// Sets the exclusion set.
    ///
    /// Default: empty
    pub fn exclusions(mut self, modules: ModuleSet) -> Self {
        self.exclusions = modules;
        self
    }

    /// Records the target platform.
    ///
    /// Default: None
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if `entry_point` is unset or `search_paths` is empty.
    pub fn build(self) -> Result<BundleDescriptor> {
        let entry_point = self.entry_point.ok_or_else(|| ConfigError::MissingField {
            field: "entry_point".to_string(),
        })?;
        if self.search_paths.is_empty() {
            return Err(ConfigError::MissingField {
                field: "search_paths".to_string(),
            }
            .into());
        }

        let mut descriptor = emit(
            &self.resolved,
            &self.exclusions,
            entry_point,
            self.search_paths,
        );
        descriptor.platform = self.platform;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> ModuleSet {
        ids.iter().map(|s| ModuleId::parse(*s).unwrap()).collect()
    }

    #[test]
    fn exclusions_are_subtracted_and_listed() {
        let d = emit(
            &set(&["c", "a", "PyQt5", "b"]),
            &set(&["tkinter", "PyQt5"]),
            "main.py",
            ["src", "lib"],
        );

        assert_eq!(d.hidden_imports(), set(&["a", "b", "c"]).into_iter().collect::<Vec<_>>());
        assert_eq!(d.excludes(), set(&["PyQt5", "tkinter"]).into_iter().collect::<Vec<_>>());
        assert_eq!(d.search_paths(), [PathBuf::from("src"), PathBuf::from("lib")]);
        assert_eq!(d.platform(), None);
    }

    #[test]
    fn builder_requires_entry_point_and_search_paths() {
        assert!(DescriptorBuilder::new().search_paths(["src"]).build().is_err());
        assert!(DescriptorBuilder::new().entry_point("m.py").build().is_err());
        assert!(
            DescriptorBuilder::new()
                .entry_point("m.py")
                .search_paths(["src"])
                .build()
                .is_ok()
        );
    }

    #[test]
    fn serializes_with_sorted_lists() {
        let d = DescriptorBuilder::new()
            .entry_point("m.py")
            .search_paths(["src"])
            .resolved(set(&["z", "a"]))
            .platform(Platform::MacOs)
            .build()
            .unwrap();

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["hidden_imports"], serde_json::json!(["a", "z"]));
        assert_eq!(json["platform"], "macos");
    }
}
