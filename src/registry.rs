//! `ModuleLoader`: the concurrent, one-shot module registry (spec §4.3/§5).
//!
//! Publication is per-key single-publisher: the first thread to ask for an
//! identifier becomes its definer and every other thread blocks on that
//! definer's [`PendingEntry`] until it resolves. A thread-local scratch map
//! lets a definer's *own* thread short-circuit back to a module it is
//! already in the middle of constructing, which is what makes a cyclic
//! dependency graph (spec §8 scenario 6) terminate instead of deadlocking
//! a thread against its own pending entry.

use crate::dependency::Dependency;
use crate::error::{ModuleError, ModuleResult};
use crate::identifier::ModuleIdentifier;
use crate::module::Module;
use crate::permissions::{DenyAll, LoaderOptions, RedefinePermission};
use crate::resource::ResourceLoader;
use crate::spec::{DependencySpec, ModuleSpec};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

thread_local! {
    /// Modules the *current thread* is in the middle of defining, keyed by
    /// `(loader identity, module identifier)` so that nested loaders on the
    /// same thread don't collide.
    static IN_PROGRESS: RefCell<std::collections::HashMap<(usize, ModuleIdentifier), Arc<Module>>> =
        RefCell::new(std::collections::HashMap::new());
}

/// Abstract hook implemented by whoever owns a `ModuleLoader`: resolves an
/// identifier not yet seen by this registry into a `ModuleSpec` (spec §4.3
/// `findModule`). `Ok(None)` means "no such module"; it is not an error.
pub trait ModuleFinder: fmt::Debug + Send + Sync {
    fn find_module(&self, identifier: &ModuleIdentifier) -> ModuleResult<Option<ModuleSpec>>;
}

enum SlotState {
    Pending,
    Ready(Arc<Module>),
    Failed(String),
}

struct PendingEntry {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl PendingEntry {
    fn pending() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        })
    }

    fn publish_ready(&self, module: Arc<Module>) {
        *self.state.lock().unwrap() = SlotState::Ready(module);
        self.ready.notify_all();
    }

    fn publish_failed(&self, reason: String) {
        *self.state.lock().unwrap() = SlotState::Failed(reason);
        self.ready.notify_all();
    }

    /// Blocks until the definer publishes a terminal state. The only lock
    /// held across the wait is this entry's own monitor (spec §5
    /// "suspension points").
    fn wait(&self, identifier: &ModuleIdentifier) -> ModuleResult<Arc<Module>> {
        let mut state = self.state.lock().unwrap();
        while matches!(&*state, SlotState::Pending) {
            state = self.ready.wait(state).unwrap();
        }
        match &*state {
            SlotState::Ready(module) => Ok(module.clone()),
            SlotState::Failed(reason) => Err(ModuleError::DefinitionFailed {
                identifier: identifier.clone(),
                reason: reason.clone(),
            }),
            SlotState::Pending => unreachable!("loop only exits on a terminal state"),
        }
    }
}

pub struct ModuleLoader {
    entries: DashMap<ModuleIdentifier, Arc<PendingEntry>>,
    finder: Arc<dyn ModuleFinder>,
    permission: Arc<dyn RedefinePermission>,
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("defined", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ModuleLoader {
    /// A loader that never grants administrative redefinition; use
    /// [`ModuleLoader::with_permission`] to opt in.
    pub fn new(finder: Arc<dyn ModuleFinder>) -> Arc<Self> {
        Self::with_permission(finder, Arc::new(DenyAll))
    }

    pub fn with_permission(
        finder: Arc<dyn ModuleFinder>,
        permission: Arc<dyn RedefinePermission>,
    ) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            finder,
            permission,
        })
    }

    /// Convenience constructor for the common case of a fixed, host-config
    /// supplied `LoaderOptions` rather than a bespoke `RedefinePermission`.
    pub fn with_options(finder: Arc<dyn ModuleFinder>, options: LoaderOptions) -> Arc<Self> {
        Self::with_permission(finder, Arc::new(options))
    }

    fn identity(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }

    /// Public entry point: `preloadModule` followed by export linking
    /// (spec §4.3).
    pub fn load_module(self: &Arc<Self>, identifier: &ModuleIdentifier) -> ModuleResult<Arc<Module>> {
        let module = self.preload_module(identifier)?;
        let mut visited = HashSet::new();
        module.link_exports(&mut visited)?;
        Ok(module)
    }

    /// Default delegates straight to the local one-shot cache. A
    /// delegating loader built on top of this one can override dependency
    /// resolution per identifier by supplying a different `ModuleLoader`
    /// in a `DependencySpec::Module`'s `module_loader` field; this type
    /// itself does not delegate.
    pub fn preload_module(self: &Arc<Self>, identifier: &ModuleIdentifier) -> ModuleResult<Arc<Module>> {
        self.load_module_local(identifier)
    }

    /// The one-shot cache protocol (spec §4.3 steps 1-5).
    pub fn load_module_local(self: &Arc<Self>, identifier: &ModuleIdentifier) -> ModuleResult<Arc<Module>> {
        let key = (self.identity(), identifier.clone());
        if let Some(module) = IN_PROGRESS.with(|scratch| scratch.borrow().get(&key).cloned()) {
            return Ok(module);
        }

        match self.entries.entry(identifier.clone()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.get().clone();
                drop(occupied);
                entry.wait(identifier)
            }
            Entry::Vacant(vacant) => {
                let entry = PendingEntry::pending();
                vacant.insert(entry.clone());
                self.define(identifier, &key, &entry)
            }
        }
    }

    /// Removes the registry entry iff it still points at `module` (spec
    /// §4.3 `unloadModuleLocal`). Never cascades to dependents; live
    /// `Arc<Module>` handles already held elsewhere remain valid.
    pub fn unload_module_local(&self, module: &Arc<Module>) {
        let identifier = module.identifier().clone();
        let still_current = self
            .entries
            .get(&identifier)
            .map(|entry| {
                matches!(&*entry.state.lock().unwrap(), SlotState::Ready(m) if Arc::ptr_eq(m, module))
            })
            .unwrap_or(false);
        if still_current {
            self.entries.remove(&identifier);
        }
    }

    /// As the winning definer: invoke `findModule`, construct the
    /// `Module`, and materialize its dependency array, then publish.
    fn define(
        self: &Arc<Self>,
        identifier: &ModuleIdentifier,
        key: &(usize, ModuleIdentifier),
        entry: &Arc<PendingEntry>,
    ) -> ModuleResult<Arc<Module>> {
        log::trace!("defining module {identifier}");
        match self.try_define(identifier, key) {
            Ok(module) => {
                log::debug!("defined module {identifier}");
                entry.publish_ready(module.clone());
                Ok(module)
            }
            Err(err) => {
                log::warn!("failed to define module {identifier}: {err}");
                entry.publish_failed(err.to_string());
                self.entries.remove(identifier);
                Err(err)
            }
        }
    }

    fn try_define(
        self: &Arc<Self>,
        identifier: &ModuleIdentifier,
        key: &(usize, ModuleIdentifier),
    ) -> ModuleResult<Arc<Module>> {
        let spec = self
            .finder
            .find_module(identifier)?
            .ok_or_else(|| ModuleError::NotFound(identifier.clone()))?;

        if &spec.identifier != identifier {
            return Err(ModuleError::NameMismatch {
                requested: identifier.clone(),
                found: spec.identifier,
            });
        }

        let module = Module::new(spec)?;

        // Published to the thread-local scratch map *before* dependencies
        // are resolved, so a cycle that loops back to `identifier` on this
        // same thread finds this (still dependency-less) skeleton instead
        // of recursing into `define` again.
        IN_PROGRESS.with(|scratch| {
            scratch.borrow_mut().insert(key.clone(), module.clone());
        });
        let dependencies = self.resolve_dependencies(&module);
        IN_PROGRESS.with(|scratch| {
            scratch.borrow_mut().remove(key);
        });

        module.set_dependencies(dependencies?);
        Ok(module)
    }

    fn resolve_dependencies(self: &Arc<Self>, owner: &Arc<Module>) -> ModuleResult<Vec<Dependency>> {
        owner
            .spec()
            .dependencies
            .iter()
            .map(|dependency_spec| self.resolve_dependency(dependency_spec, owner))
            .collect()
    }

    fn resolve_dependency(
        self: &Arc<Self>,
        dependency_spec: &DependencySpec,
        owner: &Arc<Module>,
    ) -> ModuleResult<Dependency> {
        match dependency_spec {
            DependencySpec::Local {
                local_loader,
                import_filter,
                export_filter,
            } => {
                let loader = local_loader
                    .clone()
                    .unwrap_or_else(|| owner.local_loader());
                Ok(Dependency::local(loader, import_filter.clone(), export_filter.clone()))
            }
            DependencySpec::Module {
                module_loader,
                identifier,
                optional,
                import_filter,
                export_filter,
            } => {
                let loader = module_loader.clone().unwrap_or_else(|| self.clone());
                match loader.preload_module(identifier) {
                    Ok(target) => Ok(Dependency::module(
                        Some(target),
                        import_filter.clone(),
                        export_filter.clone(),
                    )),
                    Err(_) if *optional => {
                        log::debug!("optional dependency on {identifier} is absent");
                        Ok(Dependency::silent(import_filter.clone(), export_filter.clone()))
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    fn check_permission(&self) -> ModuleResult<()> {
        if self.permission.is_redefine_allowed() {
            Ok(())
        } else {
            Err(ModuleError::PermissionDenied)
        }
    }

    /// Administrative `refreshResourceLoaders` (spec §4.3): re-linking a
    /// module re-reads its local loaders, which are required to be pure
    /// with respect to their construction arguments (spec §4.2) — so all
    /// this has to do is drop the cached export map.
    pub fn refresh_resource_loaders(&self, module: &Arc<Module>) -> ModuleResult<()> {
        self.check_permission()?;
        module.mark_unlinked();
        Ok(())
    }

    /// Administrative `setAndRefreshResourceLoaders`.
    pub fn set_and_refresh_resource_loaders(
        &self,
        module: &Arc<Module>,
        resource_roots: Vec<Arc<dyn ResourceLoader>>,
    ) -> ModuleResult<()> {
        self.check_permission()?;
        module.set_resource_roots(resource_roots);
        module.mark_unlinked();
        Ok(())
    }

    /// Administrative `relink`: resets to `UNLINKED`, then forces re-entry
    /// (spec §4.5 "State machine (Module)"). Callers are responsible for
    /// relinking dependents to propagate the change.
    pub fn relink(&self, module: &Arc<Module>) -> ModuleResult<()> {
        self.check_permission()?;
        module.mark_unlinked();
        let mut visited = HashSet::new();
        module.link_exports(&mut visited)?;
        Ok(())
    }

    /// Administrative `setAndRelinkDependencies`: replaces a module's
    /// dependency array outright and relinks it.
    pub fn set_and_relink_dependencies(
        self: &Arc<Self>,
        module: &Arc<Module>,
        dependency_specs: &[DependencySpec],
    ) -> ModuleResult<()> {
        self.check_permission()?;
        let resolved = dependency_specs
            .iter()
            .map(|dependency_spec| self.resolve_dependency(dependency_spec, module))
            .collect::<ModuleResult<Vec<_>>>()?;
        module.set_dependencies(resolved);
        let mut visited = HashSet::new();
        module.link_exports(&mut visited)?;
        Ok(())
    }
}
