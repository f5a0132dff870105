//! Build configuration.
//!
//! Read once per invocation, before resolution starts. Anything malformed is
//! fatal and reported as a [`ConfigError`].
//!
//! ```toml
//! extensions = ["virtual_uavs", "gps", "_debug"]
//!
//! [bundle]
//! entry_point = "src/server/__main__.py"
//! search_paths = ["src"]
//! plugin_namespace = "server.ext"
//! always_included = ["server.core"]
//! excludes = ["tkinter"]
//!
//! [platform_dependencies."server.ext.gps"]
//! linux = ["server.native.serial"]
//!
//! [manifests."server.ext.virtual_uavs"]
//! dependencies = ["server.ext.gps"]
//! ```

mod file;

use crate::error::ConfigError;
use crate::extensions::{
    Declaration, ManifestRegistry, ModuleId, ModuleSet, Platform, PlatformTable,
};
use file::ConfigFile;
use path_absolutize::Absolutize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Names starting with this marker are listed but never bundled.
pub const PRIVATE_MARKER: char = '_';

/// Validated build configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    entry_point: PathBuf,
    search_paths: Vec<PathBuf>,
    plugin_namespace: Option<ModuleId>,
    always_included: ModuleSet,
    excludes: ModuleSet,
    enabled_plugins: Vec<String>,
    platform_table: PlatformTable,
    manifests: BTreeMap<ModuleId, Declaration>,
    manifest_dir: Option<PathBuf>,
}

impl BuildConfig {
    /// Loads the configuration at `path`.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let cwd = std::env::current_dir().map_err(|source| ConfigError::ResolvePath {
            path: path.to_path_buf(),
            source,
        })?;
        let base = absolute(&base, &cwd)?;

        log::debug!("Loading build configuration from {}", path.display());
        Self::from_toml_str(&text, &base)
    }

    /// Parses configuration text, resolving relative paths against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: ConfigFile = toml::from_str(text)?;

        let bundle = raw.bundle.ok_or_else(|| missing("bundle"))?;

        let entry_point = bundle
            .entry_point
            .ok_or_else(|| missing("bundle.entry_point"))?;
        if entry_point.as_os_str().is_empty() {
            return Err(missing("bundle.entry_point"));
        }
        let entry_point = absolute(&entry_point, base_dir)?;

        if bundle.search_paths.is_empty() {
            return Err(missing("bundle.search_paths"));
        }
        let search_paths = bundle
            .search_paths
            .iter()
            .map(|p| absolute(p, base_dir))
            .collect::<Result<Vec<_>, _>>()?;

        let plugin_namespace = match bundle.plugin_namespace.as_str() {
            "" => None,
            ns => Some(module_id("bundle.plugin_namespace", ns)?),
        };

        let always_included = module_set("bundle.always_included", &bundle.always_included)?;
        let excludes = module_set("bundle.excludes", &bundle.excludes)?;

        let enabled_plugins = raw.extensions.enabled();
        for name in enabled_plugins.iter().filter(|n| !is_private(n)) {
            plugin_module_id(plugin_namespace.as_ref(), name)
                .map_err(|_| invalid_id("extensions", name))?;
        }

        let mut platform_table = PlatformTable::new();
        for (plugin, rows) in &raw.platform_dependencies {
            let field = format!("platform_dependencies.{plugin}");
            let plugin_id = module_id(&field, plugin)?;
            ensure_plugin(plugin_namespace.as_ref(), &field, &plugin_id)?;
            for (key, deps) in rows {
                let platform =
                    Platform::from_key(key).ok_or_else(|| ConfigError::UnknownPlatform {
                        field: field.clone(),
                        value: key.clone(),
                    })?;
                let deps = module_set(&format!("{field}.{key}"), deps)?;
                platform_table.insert(plugin_id.clone(), platform, deps);
            }
        }

        let mut manifests = BTreeMap::new();
        for (module, manifest) in raw.manifests {
            let field = format!("manifests.{module}");
            let id = module_id(&field, &module)?;
            ensure_plugin(plugin_namespace.as_ref(), &field, &id)?;
            if let Some(declared) = &manifest.id
                && declared != id.as_str()
            {
                return Err(ConfigError::ManifestIdMismatch {
                    module,
                    declared: declared.clone(),
                });
            }
            let declaration = manifest.into_declaration(&id)?;
            manifests.insert(id, declaration);
        }

        let manifest_dir = bundle
            .manifest_dir
            .map(|dir| absolute(&dir, base_dir))
            .transpose()?;

        if !entry_point.exists() {
            log::warn!("Entry point not found: {}", entry_point.display());
        }

        Ok(Self {
            entry_point,
            search_paths,
            plugin_namespace,
            always_included,
            excludes,
            enabled_plugins,
            platform_table,
            manifests,
            manifest_dir,
        })
    }

    /// Plugins enabled by default, in configuration order.
    ///
    /// Includes private (`_`-prefixed) names; see [`Self::initial_modules`].
    pub fn enabled_plugins(&self) -> &[String] {
        &self.enabled_plugins
    }

    /// Modules required regardless of which plugins are enabled.
    pub fn always_included(&self) -> &ModuleSet {
        &self.always_included
    }

    /// Modules that must never be bundled.
    pub fn excludes(&self) -> &ModuleSet {
        &self.excludes
    }

    /// Namespace of plugin-class modules, `None` if every module is one.
    pub fn plugin_namespace(&self) -> Option<&ModuleId> {
        self.plugin_namespace.as_ref()
    }

    /// Entry point script handed to the packaging backend.
    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }

    /// Module search paths handed to the packaging backend.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Extra per-platform dependencies.
    pub fn platform_table(&self) -> &PlatformTable {
        &self.platform_table
    }

    /// Directory of `<module>.toml` manifests, if configured.
    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Overrides the manifest directory.
    pub fn set_manifest_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.manifest_dir = Some(dir.as_ref().to_path_buf());
    }

    /// Module identifier of the plugin called `name`.
    pub fn plugin_module_id(&self, name: &str) -> Option<ModuleId> {
        plugin_module_id(self.plugin_namespace.as_ref(), name).ok()
    }

    /// The set resolution starts from: the always-included modules plus
    /// every enabled, non-private plugin.
    pub fn initial_modules(&self) -> ModuleSet {
        let mut initial = self.always_included.clone();
        initial.extend(
            self.enabled_plugins
                .iter()
                .filter(|name| !is_private(name))
                .filter_map(|name| self.plugin_module_id(name)),
        );
        initial
    }

    /// Builds a registry from the inline manifests and the manifest directory.
    pub fn registry(&self) -> ManifestRegistry {
        let mut registry = match &self.manifest_dir {
            Some(dir) => ManifestRegistry::with_manifest_dir(dir),
            None => ManifestRegistry::new(),
        };
        for (module, declaration) in &self.manifests {
            registry.declare_with(module.clone(), declaration.clone());
        }
        registry
    }
}

/// Returns `true` for names carrying the private marker.
pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIVATE_MARKER)
}

fn plugin_module_id(
    namespace: Option<&ModuleId>,
    name: &str,
) -> Result<ModuleId, crate::extensions::InvalidModuleId> {
    match namespace {
        Some(ns) => ns.child(name),
        None => ModuleId::parse(name),
    }
}

fn absolute(path: &Path, base_dir: &Path) -> Result<PathBuf, ConfigError> {
    path.absolutize_from(base_dir)
        .map(|p| p.into_owned())
        .map_err(|source| ConfigError::ResolvePath {
            path: path.to_path_buf(),
            source,
        })
}

/// Dependency rows and manifests only matter for modules the resolver expands.
fn ensure_plugin(
    namespace: Option<&ModuleId>,
    field: &str,
    module: &ModuleId,
) -> Result<(), ConfigError> {
    match namespace {
        Some(ns) if !module.is_within(ns) => Err(ConfigError::OutsidePluginNamespace {
            field: field.to_string(),
            value: module.to_string(),
            namespace: ns.to_string(),
        }),
        _ => Ok(()),
    }
}

fn module_id(field: &str, value: &str) -> Result<ModuleId, ConfigError> {
    ModuleId::parse(value).map_err(|_| invalid_id(field, value))
}

fn module_set(field: &str, values: &[String]) -> Result<ModuleSet, ConfigError> {
    values.iter().map(|v| module_id(field, v)).collect()
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
}

fn invalid_id(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidModuleId {
        field: field.to_string(),
        value: value.to_string(),
    }
}
