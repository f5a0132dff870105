//! Extension dependency resolution.
//!
//! Decides which optional plugin modules have to be embedded in a bundle:
//! the enabled plugins, the always-included base modules, and everything
//! they transitively require on the target platform.
//!
//! # Module Organization
//!
//! - [`id`] - [`ModuleId`] and [`ModuleSet`]
//! - [`registry`] - per-module dependency declarations ([`ModuleRegistry`])
//! - [`platform`] - [`Platform`] and the extra per-platform [`PlatformTable`]
//! - [`resolver`] - the fixed-point closure ([`Resolver`])

pub mod id;
pub mod platform;
pub mod registry;
pub mod resolver;

pub use id::{InvalidModuleId, ModuleId, ModuleSet};
pub use platform::{Platform, PlatformTable};
pub use registry::{
    Declaration, DependencyQuery, ExtensionManifest, ManifestRegistry, ModuleRegistry,
    RegistryError,
};
pub use resolver::{EdgeKind, Resolution, Resolver};
