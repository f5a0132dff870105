//! Module identifiers and module sets.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Dot-separated segments of ASCII letters, digits, `_` and `-`.
static MODULE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*$").expect("module id pattern compiles")
});

/// A set of module identifiers.
///
/// Ordered so that iteration, worklist seeding and emitted output are all
/// deterministic regardless of discovery order.
pub type ModuleSet = BTreeSet<ModuleId>;

/// Returned when a string is not a well-formed module identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid module identifier: {0:?}")]
pub struct InvalidModuleId(pub String);

/// Hierarchically namespaced name of a plugin or support module.
///
/// Identifiers compare by exact value. `server.ext.gps` and `server.ext.GPS`
/// are different modules.
///
/// # Examples
///
/// ```
/// use extension_bundler::extensions::ModuleId;
///
/// let ns = ModuleId::parse("server.ext").unwrap();
/// let gps = ns.child("gps").unwrap();
/// assert_eq!(gps.as_str(), "server.ext.gps");
/// assert!(gps.is_within(&ns));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId(String);

impl ModuleId {
    /// Validates and wraps an identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidModuleId> {
        let value = value.into();
        if MODULE_ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidModuleId(value))
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns the identifier of `name` nested under this one.
    pub fn child(&self, name: &str) -> Result<Self, InvalidModuleId> {
        Self::parse(format!("{}.{}", self.0, name))
    }

    /// Returns `true` if this identifier equals `namespace` or lies below it.
    ///
    /// Matching is segment-wise: `server.extra` is not within `server.ext`.
    pub fn is_within(&self, namespace: &ModuleId) -> bool {
        match self.0.strip_prefix(namespace.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleId {
    type Err = InvalidModuleId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = InvalidModuleId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.0
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_namespaced_identifiers() {
        for raw in ["core", "server.ext.virtual_uavs", "PyQt5", "net-tools.shim"] {
            assert!(ModuleId::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn rejects_empty_segments_and_whitespace() {
        for raw in ["", ".", "server..ext", "server.ext.", " core", "a b", "x/y"] {
            assert_eq!(ModuleId::parse(raw), Err(InvalidModuleId(raw.to_string())));
        }
    }

    #[test]
    fn namespace_matching_is_segment_wise() {
        let ns = ModuleId::parse("server.ext").unwrap();
        assert!(ModuleId::parse("server.ext").unwrap().is_within(&ns));
        assert!(ModuleId::parse("server.ext.gps").unwrap().is_within(&ns));
        assert!(!ModuleId::parse("server.extra").unwrap().is_within(&ns));
        assert!(!ModuleId::parse("server").unwrap().is_within(&ns));
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: ModuleId = serde_json::from_str("\"a.b\"").unwrap();
        assert_eq!(ok.segments().collect::<Vec<_>>(), ["a", "b"]);
        assert!(serde_json::from_str::<ModuleId>("\"a..b\"").is_err());
    }
}
