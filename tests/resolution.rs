//! End-to-end scenarios seeded by spec §8 "TESTABLE PROPERTIES": local
//! symbol load, import without re-export, re-export, filtered export,
//! filtered import, and a cyclic module graph.

use modlink::{
    Dependency, DependencyKind, DependencySpec, ModuleError, ModuleFinder, ModuleIdentifier,
    ModuleLoader, ModuleResult, ModuleSpec, Namespace, PathFilterBuilder, Resource, ResourceLoader,
    Symbol,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A fixed-content `ResourceLoader` fixture, independent of the crate's
/// own `#[cfg(test)]` fixtures since integration tests link against the
/// ordinary (non-test) rlib.
#[derive(Debug, Default)]
struct FixtureLoader {
    symbols: HashMap<String, Arc<[u8]>>,
    resources: HashMap<String, Arc<[u8]>>,
}

impl FixtureLoader {
    fn new() -> Self {
        Self::default()
    }

    fn with_symbol(mut self, name: &str, data: &[u8]) -> Self {
        self.symbols.insert(name.to_string(), data.into());
        self
    }

    fn with_resource(mut self, path: &str, data: &[u8]) -> Self {
        self.resources.insert(path.to_string(), data.into());
        self
    }
}

impl ResourceLoader for FixtureLoader {
    fn paths(&self) -> ModuleResult<HashSet<String>> {
        let mut paths: HashSet<String> = self
            .symbols
            .keys()
            .map(|name| name.rsplit_once('.').map(|(c, _)| c.replace('.', "/")).unwrap_or_default())
            .collect();
        paths.extend(
            self.resources
                .keys()
                .filter_map(|p| p.rsplit_once('/').map(|(dir, _)| dir.to_string())),
        );
        Ok(paths)
    }

    fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        Ok(self.symbols.get(name).map(|data| Symbol {
            name: name.to_string(),
            data: data.clone(),
        }))
    }

    fn load_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        Ok(self.resources.get(path).map(|data| Resource {
            path: path.to_string(),
            data: data.clone(),
        }))
    }
}

/// Resolves identifiers against a fixed, pre-built table of specs — the
/// test-fixture equivalent of a descriptor directory.
#[derive(Debug)]
struct FixedFinder {
    specs: HashMap<ModuleIdentifier, ModuleSpec>,
}

impl ModuleFinder for FixedFinder {
    fn find_module(&self, identifier: &ModuleIdentifier) -> ModuleResult<Option<ModuleSpec>> {
        Ok(self.specs.get(identifier).cloned())
    }
}

fn loader(specs: Vec<ModuleSpec>) -> Arc<ModuleLoader> {
    let specs = specs
        .into_iter()
        .map(|spec| (spec.identifier.clone(), spec))
        .collect();
    ModuleLoader::new(Arc::new(FixedFinder { specs }))
}

fn id(text: &str) -> ModuleIdentifier {
    text.parse().unwrap()
}

#[test]
fn scenario_1_local_symbol_load() {
    let root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_symbol("p.q.Foo", b"foo body"));
    let a = ModuleSpec::builder(id("test:a"))
        .add_resource_root(root)
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a]);
    let module_a = loader.load_module(&id("test:a")).unwrap();
    let ns = Namespace::new(&module_a);

    assert_eq!(&*ns.load_symbol("p.q.Foo").unwrap().unwrap().data, b"foo body");
    assert!(ns.load_symbol("p.q.Bar").unwrap().is_none());
}

#[test]
fn scenario_2_import_without_reexport_does_not_propagate() {
    let b_root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_symbol("p.q.Foo", b"foo body"));
    let b = ModuleSpec::builder(id("test:b"))
        .add_resource_root(b_root)
        .add_dependency(DependencySpec::local())
        .build();

    // A -> B, default DependencySpec::module() filters: import accept_all,
    // export reject_all (non-exporting, spec §3 defaults).
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:b")))
        .add_dependency(DependencySpec::local())
        .build();

    let c = ModuleSpec::builder(id("test:c"))
        .add_dependency(DependencySpec::module(id("test:a")))
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a, b, c]);
    let module_a = loader.load_module(&id("test:a")).unwrap();
    let module_c = loader.load_module(&id("test:c")).unwrap();

    let ns_a = Namespace::new(&module_a);
    assert!(ns_a.load_symbol("p.q.Foo").unwrap().is_some());
    assert!(ns_a.load_exported_symbol("p.q.Foo").unwrap().is_none());

    let ns_c = Namespace::new(&module_c);
    assert!(ns_c.load_symbol("p.q.Foo").unwrap().is_none());
}

#[test]
fn scenario_3_reexport_propagates_transitively() {
    let b_root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_symbol("p.q.Foo", b"foo body"));
    let b = ModuleSpec::builder(id("test:b"))
        .add_resource_root(b_root)
        .add_dependency(DependencySpec::local())
        .build();

    // A -> B, this time re-exported.
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:b")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let c = ModuleSpec::builder(id("test:c"))
        .add_dependency(DependencySpec::module(id("test:a")))
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a, b, c]);
    let module_a = loader.load_module(&id("test:a")).unwrap();
    let module_c = loader.load_module(&id("test:c")).unwrap();

    let ns_a = Namespace::new(&module_a);
    assert_eq!(&*ns_a.load_exported_symbol("p.q.Foo").unwrap().unwrap().data, b"foo body");

    let ns_c = Namespace::new(&module_c);
    assert_eq!(&*ns_c.load_symbol("p.q.Foo").unwrap().unwrap().data, b"foo body");
}

#[test]
fn scenario_4_filtered_export_narrows_what_reexports() {
    let b_root: Arc<dyn ResourceLoader> = Arc::new(
        FixtureLoader::new()
            .with_symbol("org.jboss.Foo", b"jboss")
            .with_symbol("com.acme.Bar", b"acme"),
    );
    let b = ModuleSpec::builder(id("test:b"))
        .add_resource_root(b_root)
        .add_dependency(DependencySpec::local())
        .build();

    let export_filter = PathFilterBuilder::new(true).exclude_path("org/jboss/**").build();
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:b")).with_export_filter(export_filter))
        .add_dependency(DependencySpec::local())
        .build();

    let c = ModuleSpec::builder(id("test:c"))
        .add_dependency(DependencySpec::module(id("test:a")))
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a, b, c]);
    let module_c = loader.load_module(&id("test:c")).unwrap();
    let ns_c = Namespace::new(&module_c);

    assert!(ns_c.load_symbol("com.acme.Bar").unwrap().is_some());
    assert!(ns_c.load_symbol("org.jboss.Foo").unwrap().is_none());
}

#[test]
fn scenario_5_filtered_import_hides_resource_only_through_the_edge() {
    let b_root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_resource("nested/nested.txt", b"contents"));
    let b = ModuleSpec::builder(id("test:b"))
        .add_resource_root(b_root)
        .add_dependency(DependencySpec::local())
        .build();

    let import_filter = PathFilterBuilder::new(true).exclude_path("nested").build();
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(
            DependencySpec::module(id("test:b"))
                .with_import_filter(import_filter)
                .exported(),
        )
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a, b]);
    let module_a = loader.load_module(&id("test:a")).unwrap();
    let module_b = loader.load_module(&id("test:b")).unwrap();

    let ns_a = Namespace::new(&module_a);
    assert!(ns_a.get_resource("nested/nested.txt").unwrap().is_none());

    let ns_b = Namespace::new(&module_b);
    assert!(ns_b.get_resource("nested/nested.txt").unwrap().is_some());
}

#[test]
fn scenario_6_cyclic_graph_terminates_and_resolves() {
    // A -> B -> C -> A (all re-exporting), plus C -> D -> A.
    let d_root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_symbol("p.q.Foo", b"cycle body"));
    let d = ModuleSpec::builder(id("test:d"))
        .add_resource_root(d_root)
        .add_dependency(DependencySpec::module(id("test:a")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:b")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let b = ModuleSpec::builder(id("test:b"))
        .add_dependency(DependencySpec::module(id("test:c")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let c = ModuleSpec::builder(id("test:c"))
        .add_dependency(DependencySpec::module(id("test:a")).exported())
        .add_dependency(DependencySpec::module(id("test:d")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let loader = loader(vec![a, b, c, d]);

    // Loading any module in the cycle terminates.
    let module_a = loader.load_module(&id("test:a")).unwrap();
    let module_b = loader.load_module(&id("test:b")).unwrap();
    let module_c = loader.load_module(&id("test:c")).unwrap();
    let module_d = loader.load_module(&id("test:d")).unwrap();

    for module in [&module_a, &module_b, &module_c, &module_d] {
        let ns = Namespace::new(module);
        assert_eq!(
            &*ns.load_symbol("p.q.Foo").unwrap().unwrap().data,
            b"cycle body",
            "symbol should resolve from every point in the cycle"
        );
    }

    // get_resources is deduplicated per distinct underlying provider, not
    // per cycle traversal: D is the sole provider of a `p/q` resource, so
    // exactly one hit comes back even though the cycle offers multiple
    // paths to reach it.
    let d_resource_root: Arc<dyn ResourceLoader> =
        Arc::new(FixtureLoader::new().with_resource("p/q/data.txt", b"one copy"));
    let d2 = ModuleSpec::builder(id("test:d2"))
        .add_resource_root(d_resource_root)
        .add_dependency(DependencySpec::module(id("test:a2")).exported())
        .add_dependency(DependencySpec::local())
        .build();
    let a2 = ModuleSpec::builder(id("test:a2"))
        .add_dependency(DependencySpec::module(id("test:b2")).exported())
        .add_dependency(DependencySpec::local())
        .build();
    let b2 = ModuleSpec::builder(id("test:b2"))
        .add_dependency(DependencySpec::module(id("test:c2")).exported())
        .add_dependency(DependencySpec::local())
        .build();
    let c2 = ModuleSpec::builder(id("test:c2"))
        .add_dependency(DependencySpec::module(id("test:a2")).exported())
        .add_dependency(DependencySpec::module(id("test:d2")).exported())
        .add_dependency(DependencySpec::local())
        .build();

    let loader2 = loader(vec![a2, b2, c2, d2]);
    let module_a2 = loader2.load_module(&id("test:a2")).unwrap();
    let ns_a2 = Namespace::new(&module_a2);
    let hits = ns_a2.get_resources("p/q/data.txt").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(&*hits[0].data, b"one copy");
}

#[test]
fn loading_the_same_identifier_twice_returns_the_same_module() {
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::local())
        .build();
    let loader = loader(vec![a]);

    let first = loader.load_module(&id("test:a")).unwrap();
    let second = loader.load_module(&id("test:a")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn optional_missing_dependency_is_silent_not_an_error() {
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:missing")).optional())
        .add_dependency(DependencySpec::local())
        .build();
    let loader = loader(vec![a]);

    let module_a = loader.load_module(&id("test:a")).unwrap();
    let missing_dep = module_a
        .dependencies()
        .iter()
        .find(|dep| matches!(dep.kind, DependencyKind::Module(_)))
        .map(Dependency::is_silent);
    assert_eq!(missing_dep, Some(true));
}

#[test]
fn non_optional_missing_dependency_fails_at_link_time() {
    let a = ModuleSpec::builder(id("test:a"))
        .add_dependency(DependencySpec::module(id("test:missing")))
        .add_dependency(DependencySpec::local())
        .build();
    let loader = loader(vec![a]);

    let err = loader.load_module(&id("test:a")).unwrap_err();
    assert!(matches!(err, ModuleError::NotFound(_)));
}
