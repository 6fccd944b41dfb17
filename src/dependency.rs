//! A materialized `Dependency` (spec §3/§4.3): one edge in the module
//! graph, resolved to either a local content provider or another module,
//! carrying both path filters.

use crate::filter::PathFilter;
use crate::module::Module;
use crate::resource::LocalLoader;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Clone)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub import_filter: PathFilter,
    pub export_filter: PathFilter,
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("kind", &self.kind)
            .field("import_filter", &self.import_filter)
            .field("export_filter", &self.export_filter)
            .finish()
    }
}

#[derive(Clone)]
pub enum DependencyKind {
    /// Resolved eagerly at materialization time (see SPEC_FULL.md §9).
    Local(Arc<dyn LocalLoader>),
    /// `None` when an optional `ModuleDependencySpec`'s target failed to
    /// load — a *silent* dependency that contributes nothing (spec §3).
    /// `Some` holds a weak handle: the registry is the sole strong owner
    /// of every `Module` (design note §9 "weak handle ... resolved on
    /// use"), which is what keeps cyclic module graphs from leaking.
    Module(Option<Weak<Module>>),
}

impl Dependency {
    pub fn local(loader: Arc<dyn LocalLoader>, import_filter: PathFilter, export_filter: PathFilter) -> Self {
        Self {
            kind: DependencyKind::Local(loader),
            import_filter,
            export_filter,
        }
    }

    pub fn module(
        target: Option<Arc<Module>>,
        import_filter: PathFilter,
        export_filter: PathFilter,
    ) -> Self {
        Self {
            kind: DependencyKind::Module(target.map(|m| Arc::downgrade(&m))),
            import_filter,
            export_filter,
        }
    }

    pub fn silent(import_filter: PathFilter, export_filter: PathFilter) -> Self {
        Self {
            kind: DependencyKind::Module(None),
            import_filter,
            export_filter,
        }
    }

    /// `Some` unless this is a silent dependency or its module target has
    /// since been dropped.
    pub fn target_module(&self) -> Option<Arc<Module>> {
        match &self.kind {
            DependencyKind::Module(weak) => weak.as_ref().and_then(Weak::upgrade),
            DependencyKind::Local(_) => None,
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(&self.kind, DependencyKind::Module(None))
    }
}
