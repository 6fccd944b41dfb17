//! `Module` (spec §3/§4.4): a materialized module and its export-linking
//! algorithm.
//!
//! A `Module` is built in two steps. `Module::new` constructs the local
//! loader and path set from its `ModuleSpec` eagerly — this is always
//! cheap, bounded work. Its dependency array is filled in afterwards by
//! whoever is defining it (the registry), since resolving a `ModuleSpec`'s
//! `DependencySpec`s into `Dependency`s may itself require loading other
//! modules. Export linking is lazier still: it only runs the first time
//! something asks for this module's exports, and its result is cached.

use crate::dependency::{Dependency, DependencyKind};
use crate::error::ModuleResult;
use crate::identifier::ModuleIdentifier;
use crate::resource::{AggregateLocalLoader, LocalLoader, ResourceLoader};
use crate::spec::ModuleSpec;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

enum LinkState {
    Unlinked,
    Linked(Arc<HashMap<String, Vec<Dependency>>>),
}

pub struct Module {
    spec: ModuleSpec,
    local: RwLock<Arc<dyn LocalLoader>>,
    dependencies: RwLock<Arc<Vec<Dependency>>>,
    link_state: RwLock<LinkState>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("identifier", &self.spec.identifier)
            .finish_non_exhaustive()
    }
}

impl Module {
    /// Builds the local loader and computes its path set; dependencies are
    /// left empty until `set_dependencies` is called by the defining
    /// loader.
    pub fn new(spec: ModuleSpec) -> ModuleResult<Arc<Module>> {
        let local: Arc<dyn LocalLoader> =
            Arc::new(AggregateLocalLoader::new(spec.resource_roots.clone()));
        Ok(Arc::new(Module {
            spec,
            local: RwLock::new(local),
            dependencies: RwLock::new(Arc::new(Vec::new())),
            link_state: RwLock::new(LinkState::Unlinked),
        }))
    }

    pub fn identifier(&self) -> &ModuleIdentifier {
        &self.spec.identifier
    }

    pub fn main_class(&self) -> Option<&str> {
        self.spec.main_class.as_deref()
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn local_loader(&self) -> Arc<dyn LocalLoader> {
        self.local.read().unwrap().clone()
    }

    /// Administrative `setAndRefreshResourceLoaders` (spec §4.3): replaces
    /// this module's resource roots outright. Callers must `mark_unlinked`
    /// (or call `relink`) afterwards and are responsible for relinking
    /// dependents (spec §4.3 note).
    pub fn set_resource_roots(&self, resource_roots: Vec<Arc<dyn ResourceLoader>>) {
        let local: Arc<dyn LocalLoader> = Arc::new(AggregateLocalLoader::new(resource_roots));
        *self.local.write().unwrap() = local;
    }

    /// Snapshot of this module's materialized dependency array, in author
    /// order (invariant 5).
    pub fn dependencies(&self) -> Arc<Vec<Dependency>> {
        self.dependencies.read().unwrap().clone()
    }

    /// Called exactly once by the defining loader, before this module is
    /// published and so before any other thread can observe it (invariant
    /// 2). `relink` below is the only thing allowed to call this again,
    /// and only under the administrative permission gate.
    pub fn set_dependencies(&self, dependencies: Vec<Dependency>) {
        *self.dependencies.write().unwrap() = Arc::new(dependencies);
        *self.link_state.write().unwrap() = LinkState::Unlinked;
    }

    pub fn is_linked(&self) -> bool {
        matches!(&*self.link_state.read().unwrap(), LinkState::Linked(_))
    }

    /// Drops the cached export map, forcing the next `link_exports` call
    /// to recompute it against the current dependency array. Used by the
    /// registry's administrative `relink`/`setAndRelinkDependencies`.
    pub fn mark_unlinked(&self) {
        *self.link_state.write().unwrap() = LinkState::Unlinked;
    }

    /// Computes (and caches) this module's `exportedPaths` map: spec
    /// §4.4's export-linking algorithm.
    ///
    /// `visited` is fresh per top-level call and threaded through the
    /// recursion so a cycle (spec §8 scenario 6, A -> B -> C -> A)
    /// terminates rather than looping forever: a module encountered while
    /// it is still being linked further up the current call chain
    /// contributes nothing on this pass, since the ancestor's own pass
    /// will account for the rest of the cycle once it completes.
    pub fn link_exports(
        self: &Arc<Self>,
        visited: &mut std::collections::HashSet<ModuleIdentifier>,
    ) -> ModuleResult<Arc<HashMap<String, Vec<Dependency>>>> {
        if let LinkState::Linked(map) = &*self.link_state.read().unwrap() {
            return Ok(map.clone());
        }

        if !visited.insert(self.identifier().clone()) {
            return Ok(Arc::new(HashMap::new()));
        }

        let mut exported: HashMap<String, Vec<Dependency>> = HashMap::new();
        for dep in self.dependencies().iter() {
            match &dep.kind {
                DependencyKind::Local(local) => {
                    for path in local.paths()? {
                        if dep.export_filter.matches(&path) {
                            exported.entry(path).or_default().push(dep.clone());
                        }
                    }
                }
                DependencyKind::Module(weak) => {
                    let Some(target) = weak.as_ref().and_then(Weak::upgrade) else {
                        continue;
                    };
                    let target_exports = target.link_exports(visited)?;
                    for (path, deps) in target_exports.iter() {
                        if dep.import_filter.matches(path) && dep.export_filter.matches(path) {
                            exported
                                .entry(path.clone())
                                .or_default()
                                .extend(deps.iter().cloned());
                        }
                    }
                }
            }
        }

        let exported = Arc::new(exported);
        *self.link_state.write().unwrap() = LinkState::Linked(exported.clone());
        Ok(exported)
    }
}
