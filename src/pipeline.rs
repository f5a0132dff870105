//! Resolution pipeline orchestration.
//!
//! Coordinates the stages that turn a build configuration into a bundle
//! descriptor:
//!
//! 1. Compute the initial module set from [`BuildConfig`]
//! 2. Resolve its closure with the registry and platform table
//! 3. Apply the exclusion policy
//! 4. Emit the [`BundleDescriptor`]
//!
//! # Example
//!
//! ```no_run
//! use extension_bundler::config::BuildConfig;
//! use extension_bundler::extensions::Platform;
//! use extension_bundler::pipeline::Pipeline;
//!
//! # fn example() -> extension_bundler::Result<()> {
//! let config = BuildConfig::load_from_path("bundle.toml")?;
//! let output = Pipeline::new(config).platform(Platform::Linux).run()?;
//!
//! for module in output.descriptor.hidden_imports() {
//!     println!("{module}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::bundle::{BundleDescriptor, DescriptorBuilder};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::extensions::{
    ManifestRegistry, ModuleRegistry, ModuleSet, Platform, Resolution, Resolver,
};

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Full resolution, including modules later excluded
    pub resolution: Resolution,
    /// Descriptor for the packaging backend
    pub descriptor: BundleDescriptor,
}

/// Main pipeline orchestrator.
pub struct Pipeline<R: ModuleRegistry = ManifestRegistry> {
    config: BuildConfig,
    registry: R,
    platform: Platform,
}

impl Pipeline<ManifestRegistry> {
    /// Creates a pipeline using the registry described by `config`, targeting
    /// the host platform.
    pub fn new(config: BuildConfig) -> Self {
        let registry = config.registry();
        Self::with_registry(config, registry)
    }
}

impl<R: ModuleRegistry> Pipeline<R> {
    /// Creates a pipeline with an explicit registry.
    pub fn with_registry(config: BuildConfig, registry: R) -> Self {
        Self {
            config,
            registry,
            platform: Platform::current(),
        }
    }

    /// Sets the target platform.
    ///
    /// Default: [`Platform::current()`]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Returns the build configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Returns the registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the target platform.
    pub fn target_platform(&self) -> Platform {
        self.platform
    }

    /// Exclusions after the base-module policy is applied.
    ///
    /// Always-included modules are never excluded; any configured exclusion
    /// naming one is dropped with a warning.
    pub fn effective_exclusions(&self) -> ModuleSet {
        let always = self.config.always_included();
        let mut effective = ModuleSet::new();
        for module in self.config.excludes() {
            if always.contains(module) {
                log::warn!("Ignoring exclusion of {module}: it is an always-included module");
            } else {
                effective.insert(module.clone());
            }
        }
        effective
    }

    /// Runs resolution and emits the descriptor.
    pub fn run(&self) -> Result<PipelineOutput> {
        let initial = self.config.initial_modules();
        log::info!(
            "Resolving {} initial modules ({} enabled plugins) for {}",
            initial.len(),
            self.config.enabled_plugins().len(),
            self.platform
        );

        let resolution = Resolver::new(&self.registry, self.config.platform_table())
            .plugin_namespace(self.config.plugin_namespace().cloned())
            .resolve(&initial, self.platform);

        if !resolution.unavailable().is_empty() {
            log::warn!(
                "{} modules could not be loaded and were included without expansion",
                resolution.unavailable().len()
            );
        }

        let exclusions = self.effective_exclusions();
        for module in resolution.modules().intersection(&exclusions) {
            log::info!("Excluding resolved module {module}");
        }

        let descriptor = DescriptorBuilder::new()
            .entry_point(self.config.entry_point())
            .search_paths(self.config.search_paths())
            .resolved(resolution.modules().clone())
            .exclusions(exclusions)
            .platform(self.platform)
            .build()?;

        log::info!(
            "Descriptor lists {} inclusions and {} exclusions",
            descriptor.hidden_imports().len(),
            descriptor.excludes().len()
        );

        Ok(PipelineOutput {
            resolution,
            descriptor,
        })
    }
}
