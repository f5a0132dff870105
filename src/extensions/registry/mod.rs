//! Module registry
//!
//! Answers "what does this module depend on?" without ever failing the build.
//! Declarations come from statically declared manifests, either registered in
//! memory or read lazily from a manifest directory.

mod manifest;

pub use manifest::ExtensionManifest;

use super::{ModuleId, ModuleSet};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callable dependency query registered for a module.
pub type DependencyQuery = Arc<dyn Fn() -> Vec<ModuleId> + Send + Sync>;

/// What a loadable module says about its dependencies.
#[derive(Clone)]
pub enum Declaration {
    /// The module loads but exposes no dependency information
    None,
    /// A static dependency collection
    Static(ModuleSet),
    /// A dependency query evaluated on demand
    Query(DependencyQuery),
}

impl Declaration {
    /// Normalizes the declaration to a set.
    pub fn dependencies(&self) -> ModuleSet {
        match self {
            Declaration::None => ModuleSet::new(),
            Declaration::Static(deps) => deps.clone(),
            Declaration::Query(query) => query().into_iter().collect(),
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::None => f.write_str("None"),
            Declaration::Static(deps) => f.debug_tuple("Static").field(deps).finish(),
            Declaration::Query(_) => f.write_str("Query(<fn>)"),
        }
    }
}

/// Why a module's declaration could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No declaration exists for the module
    #[error("module {module} is not available")]
    Missing {
        /// Module that was looked up
        module: ModuleId,
    },

    /// A declaration exists but cannot be used
    #[error("module {module} has a malformed manifest: {reason}")]
    Malformed {
        /// Module that was looked up
        module: ModuleId,
        /// What was wrong with it
        reason: String,
    },
}

/// Source of per-module dependency declarations.
pub trait ModuleRegistry {
    /// Attempts to load the declaration for `module`.
    fn declaration(&self, module: &ModuleId) -> Result<Declaration, RegistryError>;

    /// Returns the dependencies of `module`.
    ///
    /// Never fails: a module that cannot be loaded contributes nothing.
    fn dependencies_of(&self, module: &ModuleId) -> ModuleSet {
        match self.declaration(module) {
            Ok(declaration) => declaration.dependencies(),
            Err(e) => {
                log::warn!("{e}; treating as having no dependencies");
                ModuleSet::new()
            }
        }
    }
}

/// Registry backed by in-memory declarations and an optional manifest
/// directory.
///
/// In-memory declarations win over the directory. Directory manifests are
/// read on each lookup; the resolver looks each module up at most once.
///
/// # Examples
///
/// ```
/// use extension_bundler::extensions::{ManifestRegistry, ModuleId, ModuleRegistry};
///
/// let core = ModuleId::parse("core").unwrap();
/// let logging = ModuleId::parse("logging").unwrap();
///
/// let mut registry = ManifestRegistry::new();
/// registry.declare(core.clone(), [logging.clone()]);
///
/// assert!(registry.dependencies_of(&core).contains(&logging));
/// assert!(registry.dependencies_of(&logging).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    declared: BTreeMap<ModuleId, Result<Declaration, RegistryError>>,
    manifest_dir: Option<PathBuf>,
}

impl ManifestRegistry {
    /// Creates a registry with no declarations and no manifest directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that reads `<dir>/<module>.toml` on lookup.
    pub fn with_manifest_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            declared: BTreeMap::new(),
            manifest_dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    /// Sets or replaces the manifest directory.
    pub fn set_manifest_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.manifest_dir = Some(dir.as_ref().to_path_buf());
    }

    /// Returns the manifest directory, if any.
    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Declares a static dependency collection for `module`.
    pub fn declare<I>(&mut self, module: ModuleId, deps: I) -> &mut Self
    where
        I: IntoIterator<Item = ModuleId>,
    {
        let deps = deps.into_iter().collect();
        self.declared.insert(module, Ok(Declaration::Static(deps)));
        self
    }

    /// Declares a dependency query for `module`.
    pub fn declare_query<F>(&mut self, module: ModuleId, query: F) -> &mut Self
    where
        F: Fn() -> Vec<ModuleId> + Send + Sync + 'static,
    {
        self.declared
            .insert(module, Ok(Declaration::Query(Arc::new(query))));
        self
    }

    /// Records an already-built declaration for `module`.
    pub fn declare_with(&mut self, module: ModuleId, declaration: Declaration) -> &mut Self {
        self.declared.insert(module, Ok(declaration));
        self
    }

    /// Declares that `module` loads but has no dependency information.
    pub fn declare_empty(&mut self, module: ModuleId) -> &mut Self {
        self.declared.insert(module, Ok(Declaration::None));
        self
    }

    /// Records that `module` exists but cannot be loaded.
    pub fn declare_malformed(&mut self, module: ModuleId, reason: impl Into<String>) -> &mut Self {
        let err = RegistryError::Malformed {
            module: module.clone(),
            reason: reason.into(),
        };
        self.declared.insert(module, Err(err));
        self
    }

    /// Number of in-memory declarations.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Returns `true` if nothing was declared in memory.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    fn load_from_dir(&self, module: &ModuleId) -> Result<Declaration, RegistryError> {
        let Some(dir) = &self.manifest_dir else {
            return Err(RegistryError::Missing {
                module: module.clone(),
            });
        };

        let path = dir.join(format!("{module}.toml"));
        log::debug!("Loading manifest for {} from {}", module, path.display());
        ExtensionManifest::from_file(module, &path)?.into_declaration(module)
    }
}

impl ModuleRegistry for ManifestRegistry {
    fn declaration(&self, module: &ModuleId) -> Result<Declaration, RegistryError> {
        match self.declared.get(module) {
            Some(declared) => declared.clone(),
            None => self.load_from_dir(module),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(s: &str) -> ModuleId {
        ModuleId::parse(s).unwrap()
    }

    #[test]
    fn unknown_module_is_missing_and_has_no_dependencies() {
        let registry = ManifestRegistry::new();
        assert_eq!(
            registry.declaration(&id("ext.ghost")).unwrap_err(),
            RegistryError::Missing {
                module: id("ext.ghost")
            }
        );
        assert!(registry.dependencies_of(&id("ext.ghost")).is_empty());
    }

    #[test]
    fn query_declarations_are_invoked_and_normalized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = ManifestRegistry::new();
        registry.declare_query(id("ext.a"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![id("b"), id("c"), id("b")]
        });

        let deps = registry.dependencies_of(&id("ext.a"));
        assert_eq!(deps, ModuleSet::from([id("b"), id("c")]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_module_does_not_affect_others() {
        let mut registry = ManifestRegistry::new();
        registry
            .declare_malformed(id("ext.bad"), "import error")
            .declare(id("ext.good"), [id("x")])
            .declare_empty(id("ext.quiet"));

        assert!(registry.dependencies_of(&id("ext.bad")).is_empty());
        assert_eq!(registry.dependencies_of(&id("ext.good")), ModuleSet::from([id("x")]));
        assert!(matches!(
            registry.declaration(&id("ext.quiet")),
            Ok(Declaration::None)
        ));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn in_memory_declarations_shadow_the_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ext.a.toml"), "dependencies = [\"from_disk\"]").unwrap();

        let mut registry = ManifestRegistry::with_manifest_dir(dir.path());
        assert_eq!(
            registry.dependencies_of(&id("ext.a")),
            ModuleSet::from([id("from_disk")])
        );

        registry.declare(id("ext.a"), [id("from_memory")]);
        assert_eq!(
            registry.dependencies_of(&id("ext.a")),
            ModuleSet::from([id("from_memory")])
        );
    }

    #[test]
    fn unparsable_manifest_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ext.a.toml"), "dependencies = [").unwrap();

        let registry = ManifestRegistry::with_manifest_dir(dir.path());
        assert!(matches!(
            registry.declaration(&id("ext.a")),
            Err(RegistryError::Malformed { .. })
        ));
        assert!(registry.dependencies_of(&id("ext.a")).is_empty());
    }
}
