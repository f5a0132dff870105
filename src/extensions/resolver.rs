//! Transitive closure over the extension dependency relation.
//!
//! Dependencies are only known once a module's declaration is loaded, and a
//! plugin may depend on a plugin that depends on another, so resolution is a
//! fixed-point loop rather than a single lookup.
//!
//! # Algorithm
//!
//! 1. Seed the set and the worklist with the initial modules (sorted).
//! 2. Process the worklist in rounds. For each plugin-class module popped,
//!    union its declared dependencies with its platform table row; every
//!    dependency not yet in the set is added and queued for the next round.
//! 3. Stop after the first round that adds nothing.
//!
//! Membership is checked before queueing, so cycles and self-dependencies
//! stabilize once all members are present and every module is looked up at
//! most once.

use super::{ModuleId, ModuleRegistry, ModuleSet, Platform, PlatformTable};
use petgraph::algo::astar;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// How a dependency edge was discovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Declared by the module itself
    Declared,
    /// Supplied by the platform dependency table
    Platform,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Declared => f.write_str("declared"),
            EdgeKind::Platform => f.write_str("platform"),
        }
    }
}

/// Expands an initial module set to its transitive closure.
///
/// # Examples
///
/// ```
/// use extension_bundler::extensions::{
///     ManifestRegistry, ModuleId, ModuleSet, Platform, PlatformTable, Resolver,
/// };
///
/// let core = ModuleId::parse("core").unwrap();
/// let logging = ModuleId::parse("logging").unwrap();
///
/// let mut registry = ManifestRegistry::new();
/// registry.declare(core.clone(), [logging.clone()]);
/// let table = PlatformTable::new();
///
/// let resolution = Resolver::new(&registry, &table)
///     .resolve(&ModuleSet::from([core.clone()]), Platform::Linux);
///
/// assert_eq!(resolution.modules(), &ModuleSet::from([core, logging]));
/// ```
pub struct Resolver<'a, R: ModuleRegistry + ?Sized> {
    registry: &'a R,
    table: &'a PlatformTable,
    namespace: Option<ModuleId>,
}

impl<'a, R: ModuleRegistry + ?Sized> Resolver<'a, R> {
    /// Creates a resolver that treats every module as plugin-class.
    pub fn new(registry: &'a R, table: &'a PlatformTable) -> Self {
        Self {
            registry,
            table,
            namespace: None,
        }
    }

    /// Restricts dependency lookups to modules within `namespace`.
    ///
    /// `None` makes every module plugin-class.
    pub fn plugin_namespace(mut self, namespace: Option<ModuleId>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Returns `true` if dependencies of `module` are looked up.
    pub fn is_plugin(&self, module: &ModuleId) -> bool {
        match &self.namespace {
            Some(ns) => module.is_within(ns),
            None => true,
        }
    }

    /// Resolves `initial` to its closure on `platform`.
    ///
    /// Never fails. Modules whose declaration cannot be loaded stay in the
    /// result and are listed in [`Resolution::unavailable`].
    pub fn resolve(&self, initial: &ModuleSet, platform: Platform) -> Resolution {
        let mut resolution = Resolution::seeded(initial);
        let mut round: VecDeque<ModuleId> = initial.iter().cloned().collect();

        while !round.is_empty() {
            let mut next = VecDeque::new();

            while let Some(module) = round.pop_front() {
                if !self.is_plugin(&module) {
                    continue;
                }

                for (dep, kind) in self.dependencies(&module, platform, &mut resolution) {
                    resolution.link(&module, &dep, kind);
                    if resolution.modules.insert(dep.clone()) {
                        log::debug!("Discovered {dep} via {module} ({kind})");
                        next.push_back(dep);
                    }
                }
            }

            resolution.growth.push(resolution.modules.len());
            round = next;
        }

        log::info!(
            "Resolved {} initial modules to {} modules in {} rounds on {}",
            resolution.initial.len(),
            resolution.modules.len(),
            resolution.rounds(),
            platform
        );

        resolution
    }

    /// Declared and platform dependencies of `module`, declared edges winning.
    fn dependencies(
        &self,
        module: &ModuleId,
        platform: Platform,
        resolution: &mut Resolution,
    ) -> BTreeMap<ModuleId, EdgeKind> {
        let declared = match self.registry.declaration(module) {
            Ok(declaration) => declaration.dependencies(),
            Err(e) => {
                log::warn!("{e}; no further modules discovered through it");
                resolution.unavailable.insert(module.clone());
                ModuleSet::new()
            }
        };

        let extra = self.table.extra_dependencies_of(module, platform);

        extra
            .into_iter()
            .map(|dep| (dep, EdgeKind::Platform))
            .chain(declared.into_iter().map(|dep| (dep, EdgeKind::Declared)))
            .collect()
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    modules: ModuleSet,
    initial: ModuleSet,
    unavailable: ModuleSet,
    growth: Vec<usize>,
    graph: DiGraph<ModuleId, EdgeKind>,
    nodes: BTreeMap<ModuleId, NodeIndex>,
}

impl Resolution {
    fn seeded(initial: &ModuleSet) -> Self {
        let mut resolution = Self {
            modules: initial.clone(),
            initial: initial.clone(),
            unavailable: ModuleSet::new(),
            growth: vec![initial.len()],
            graph: DiGraph::new(),
            nodes: BTreeMap::new(),
        };
        for module in initial {
            resolution.node(module);
        }
        resolution
    }

    fn node(&mut self, module: &ModuleId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(module) {
            return idx;
        }
        let idx = self.graph.add_node(module.clone());
        self.nodes.insert(module.clone(), idx);
        idx
    }

    fn link(&mut self, from: &ModuleId, to: &ModuleId, kind: EdgeKind) {
        let a = self.node(from);
        let b = self.node(to);
        self.graph.update_edge(a, b, kind);
    }

    /// The resolved module set.
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Consumes the resolution, returning the module set.
    pub fn into_modules(self) -> ModuleSet {
        self.modules
    }

    /// The set resolution started from.
    pub fn initial(&self) -> &ModuleSet {
        &self.initial
    }

    /// Plugin-class modules whose declaration could not be loaded.
    pub fn unavailable(&self) -> &ModuleSet {
        &self.unavailable
    }

    /// Set size before the first round and after each round.
    ///
    /// Non-decreasing. After any round ran, the last two entries are equal.
    pub fn growth(&self) -> &[usize] {
        &self.growth
    }

    /// Number of rounds run, including the final one that added nothing.
    pub fn rounds(&self) -> usize {
        self.growth.len().saturating_sub(1)
    }

    /// Returns `true` if `module` was resolved.
    pub fn contains(&self, module: &ModuleId) -> bool {
        self.modules.contains(module)
    }

    /// Modules discovered directly from `module`, with how each was found.
    pub fn dependencies_of(&self, module: &ModuleId) -> Vec<(ModuleId, EdgeKind)> {
        let Some(&idx) = self.nodes.get(module) else {
            return Vec::new();
        };
        let mut deps: Vec<_> = self
            .graph
            .edges(idx)
            .map(|edge| (self.graph[edge.target()].clone(), *edge.weight()))
            .collect();
        deps.sort_by(|a, b| a.0.cmp(&b.0));
        deps
    }

    /// Shortest chain from an initial module to `module`.
    ///
    /// Starts with the initial module and ends with `module`. Ties between
    /// initial modules go to the lexicographically smallest. `None` if the
    /// module was not resolved.
    pub fn explain(&self, module: &ModuleId) -> Option<Vec<ModuleId>> {
        let &goal = self.nodes.get(module)?;

        self.initial
            .iter()
            .filter_map(|root| {
                let &start = self.nodes.get(root)?;
                astar(&self.graph, start, |n| n == goal, |_| 1usize, |_| 0)
            })
            .min_by_key(|(cost, _)| *cost)
            .map(|(_, path)| path.into_iter().map(|n| self.graph[n].clone()).collect())
    }

    /// Renders the discovery graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
