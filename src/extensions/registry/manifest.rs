//! Extension manifest parsing
//!
//! A manifest is the static replacement for importing a plugin to ask it what
//! it needs. One manifest per module, named `<module id>.toml`.

use super::{Declaration, RegistryError};
use crate::extensions::{ModuleId, ModuleSet};
use std::path::Path;

/// Manifest file structure
///
/// ```toml
/// id = "server.ext.virtual_uavs"   # optional, must match the file name
/// dependencies = ["server.ext.gps"]
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionManifest {
    /// Module identifier, if stated explicitly
    #[serde(default)]
    pub id: Option<String>,
    /// Declared dependencies; `None` when the key is absent
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    /// Free-form description, ignored by resolution
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtensionManifest {
    /// Parse manifest text for `module`.
    pub fn parse(module: &ModuleId, text: &str) -> Result<Self, RegistryError> {
        let manifest: ExtensionManifest =
            toml::from_str(text).map_err(|e| RegistryError::Malformed {
                module: module.clone(),
                reason: format!("failed to parse manifest TOML: {}", e.message()),
            })?;

        if let Some(declared) = &manifest.id
            && declared != module.as_str()
        {
            return Err(RegistryError::Malformed {
                module: module.clone(),
                reason: format!("manifest declares id {declared:?}"),
            });
        }

        Ok(manifest)
    }

    /// Read and parse the manifest for `module` from `path`.
    ///
    /// A missing file means the module is unavailable; any other read failure
    /// means the manifest is malformed.
    pub fn from_file(module: &ModuleId, path: &Path) -> Result<Self, RegistryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::Missing {
                    module: module.clone(),
                });
            }
            Err(e) => {
                return Err(RegistryError::Malformed {
                    module: module.clone(),
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        Self::parse(module, &text)
    }

    /// Convert to a registry declaration, validating dependency identifiers.
    pub fn into_declaration(self, module: &ModuleId) -> Result<Declaration, RegistryError> {
        let Some(raw) = self.dependencies else {
            return Ok(Declaration::None);
        };

        let deps = raw
            .into_iter()
            .map(|dep| {
                ModuleId::parse(dep).map_err(|e| RegistryError::Malformed {
                    module: module.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<ModuleSet, _>>()?;

        Ok(Declaration::Static(deps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ModuleId {
        ModuleId::parse(s).unwrap()
    }

    #[test]
    fn absent_dependencies_key_declares_nothing() {
        let m = id("ext.a");
        let manifest = ExtensionManifest::parse(&m, "description = \"a\"").unwrap();
        assert!(matches!(manifest.into_declaration(&m), Ok(Declaration::None)));
    }

    #[test]
    fn duplicate_dependencies_are_deduplicated() {
        let m = id("ext.a");
        let manifest =
            ExtensionManifest::parse(&m, "dependencies = [\"ext.b\", \"ext.b\", \"c\"]").unwrap();
        match manifest.into_declaration(&m).unwrap() {
            Declaration::Static(deps) => assert_eq!(deps, ModuleSet::from([id("ext.b"), id("c")])),
            other => panic!("unexpected declaration: {other:?}"),
        }
    }

    #[test]
    fn mismatched_id_is_malformed() {
        let err = ExtensionManifest::parse(&id("ext.a"), "id = \"ext.b\"").unwrap_err();
        assert!(matches!(err, RegistryError::Malformed { .. }));
    }

    #[test]
    fn invalid_dependency_is_malformed() {
        let m = id("ext.a");
        let manifest = ExtensionManifest::parse(&m, "dependencies = [\"bad id\"]").unwrap();
        assert!(matches!(
            manifest.into_declaration(&m),
            Err(RegistryError::Malformed { .. })
        ));
    }
}
