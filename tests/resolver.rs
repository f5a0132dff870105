//! Closure properties of the resolver over in-memory registries.

use extension_bundler::bundle::emit;
use extension_bundler::extensions::{
    ManifestRegistry, ModuleId, ModuleRegistry, ModuleSet, Platform, PlatformTable, Resolver,
};

fn id(s: &str) -> ModuleId {
    ModuleId::parse(s).unwrap()
}

fn set(ids: &[&str]) -> ModuleSet {
    ids.iter().map(|s| id(s)).collect()
}

/// A small plugin graph: chains, a cycle, a self-loop, a platform edge and
/// an unloadable plugin.
fn fixture() -> (ManifestRegistry, PlatformTable) {
    let mut registry = ManifestRegistry::new();
    registry
        .declare(id("ext.a"), [id("ext.b")])
        .declare(id("ext.b"), [id("ext.c"), id("lib.support")])
        .declare(id("ext.c"), [id("ext.a")])
        .declare(id("ext.self"), [id("ext.self"), id("lib.x")])
        .declare_query(id("ext.q"), || vec![id("ext.a"), id("lib.q")])
        .declare_malformed(id("ext.broken"), "import error")
        .declare_empty(id("ext.quiet"));

    let mut table = PlatformTable::new();
    table.insert(id("ext.c"), Platform::Linux, [id("native.driver")]);
    table.insert(id("ext.c"), Platform::Windows, [id("native.win")]);

    (registry, table)
}

fn resolver<'a>(
    registry: &'a ManifestRegistry,
    table: &'a PlatformTable,
) -> Resolver<'a, ManifestRegistry> {
    Resolver::new(registry, table).plugin_namespace(Some(id("ext")))
}

#[test]
fn single_dependency_example() {
    let mut registry = ManifestRegistry::new();
    registry
        .declare(id("core"), [id("logging")])
        .declare(id("logging"), Vec::<ModuleId>::new());
    let table = PlatformTable::new();

    let resolution = Resolver::new(&registry, &table).resolve(&set(&["core"]), Platform::Linux);

    assert_eq!(resolution.modules(), &set(&["core", "logging"]));
    assert!(resolution.unavailable().is_empty());
}

#[test]
fn platform_gated_edge_is_not_applied_elsewhere() {
    let registry = ManifestRegistry::new();
    let mut table = PlatformTable::new();
    table.insert(id("pluginA"), Platform::Linux, [id("native_driver")]);

    for platform in [Platform::MacOs, Platform::Windows, Platform::Other] {
        let resolution = Resolver::new(&registry, &table).resolve(&set(&["pluginA"]), platform);
        assert_eq!(resolution.modules(), &set(&["pluginA"]), "on {platform}");
    }

    let linux = Resolver::new(&registry, &table).resolve(&set(&["pluginA"]), Platform::Linux);
    assert_eq!(linux.modules(), &set(&["pluginA", "native_driver"]));
}

#[test]
fn two_module_cycle_terminates_with_both_members() {
    let mut registry = ManifestRegistry::new();
    registry
        .declare(id("A"), [id("B")])
        .declare(id("B"), [id("A"), id("C")]);
    let table = PlatformTable::new();

    let resolution = Resolver::new(&registry, &table).resolve(&set(&["A"]), Platform::Linux);

    assert_eq!(resolution.modules(), &set(&["A", "B", "C"]));
}

#[test]
fn self_dependency_terminates() {
    let (registry, table) = fixture();
    let resolution = resolver(&registry, &table).resolve(&set(&["ext.self"]), Platform::Linux);
    assert_eq!(resolution.modules(), &set(&["ext.self", "lib.x"]));
}

#[test]
fn result_is_superset_and_closed() {
    let (registry, table) = fixture();
    let r = resolver(&registry, &table);

    for platform in [Platform::Linux, Platform::Windows] {
        let initial = set(&["ext.a", "ext.q", "ext.broken"]);
        let resolution = r.resolve(&initial, platform);
        let modules = resolution.modules();

        assert!(modules.is_superset(&initial));
        for module in modules.iter().filter(|m| r.is_plugin(m)) {
            let mut deps = registry.dependencies_of(module);
            deps.extend(table.extra_dependencies_of(module, platform));
            assert!(
                deps.is_subset(modules),
                "{module} has dependencies outside the result on {platform}"
            );
        }
    }
}

#[test]
fn growth_is_monotonic_and_ends_stable() {
    let (registry, table) = fixture();
    let resolution = resolver(&registry, &table).resolve(&set(&["ext.a"]), Platform::Linux);

    let growth = resolution.growth();
    assert!(growth.windows(2).all(|w| w[0] <= w[1]), "{growth:?}");
    assert_eq!(growth.first(), Some(&1));
    assert_eq!(growth.last(), Some(&resolution.modules().len()));
    assert_eq!(growth[growth.len() - 1], growth[growth.len() - 2]);
    // ext.a -> ext.b -> ext.c -> native.driver
    assert_eq!(resolution.rounds(), 4);
}

#[test]
fn resolving_the_output_again_adds_nothing() {
    let (registry, table) = fixture();
    let r = resolver(&registry, &table);

    let first = r.resolve(&set(&["ext.q", "ext.self"]), Platform::Windows);
    let second = r.resolve(first.modules(), Platform::Windows);

    assert_eq!(second.modules(), first.modules());
    assert_eq!(second.rounds(), 1);
}

#[test]
fn unavailable_plugin_is_kept_without_expansion() {
    let (registry, table) = fixture();
    let resolution =
        resolver(&registry, &table).resolve(&set(&["ext.broken", "ext.missing"]), Platform::Linux);

    assert_eq!(resolution.modules(), &set(&["ext.broken", "ext.missing"]));
    assert_eq!(resolution.unavailable(), &set(&["ext.broken", "ext.missing"]));
}

#[test]
fn declared_but_empty_plugin_is_not_unavailable() {
    let (registry, table) = fixture();
    let resolution = resolver(&registry, &table).resolve(&set(&["ext.quiet"]), Platform::Linux);

    assert_eq!(resolution.modules(), &set(&["ext.quiet"]));
    assert!(resolution.unavailable().is_empty());
}

#[test]
fn excluded_module_is_resolved_but_not_emitted() {
    let (registry, table) = fixture();
    let resolution = resolver(&registry, &table).resolve(&set(&["ext.a"]), Platform::Linux);
    assert!(resolution.contains(&id("lib.support")));

    let descriptor = emit(
        resolution.modules(),
        &set(&["lib.support"]),
        "main.py",
        ["src"],
    );

    assert!(!descriptor.hidden_imports().contains(&id("lib.support")));
    assert!(descriptor.excludes().contains(&id("lib.support")));
}

#[test]
fn discovery_order_does_not_affect_result() {
    let (registry, table) = fixture();
    let r = resolver(&registry, &table);

    let together = r.resolve(&set(&["ext.q", "ext.c"]), Platform::Linux);
    let mut separately = r.resolve(&set(&["ext.c"]), Platform::Linux).into_modules();
    separately.extend(r.resolve(&set(&["ext.q"]), Platform::Linux).into_modules());

    assert_eq!(together.modules(), &separately);
}

#[test]
fn explain_traces_platform_edges() {
    let (registry, table) = fixture();
    let resolution = resolver(&registry, &table).resolve(&set(&["ext.a"]), Platform::Linux);

    assert_eq!(
        resolution.explain(&id("native.driver")),
        Some(vec![id("ext.a"), id("ext.b"), id("ext.c"), id("native.driver")])
    );
}
