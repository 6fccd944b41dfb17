//! `ModuleSpec` / `DependencySpec` (spec §3): the builder-side,
//! author-order description of a module before it is materialized into a
//! live `Module`.

use crate::filter::PathFilter;
use crate::identifier::ModuleIdentifier;
use crate::registry::ModuleLoader;
use crate::resource::{LocalLoader, ResourceLoader};
use std::sync::Arc;

/// Immutable description of a module. Dependency order is author order
/// and is semantically significant: the first matching dependency wins
/// during resolution (spec invariant 5).
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub identifier: ModuleIdentifier,
    pub main_class: Option<String>,
    pub resource_roots: Vec<Arc<dyn ResourceLoader>>,
    pub dependencies: Vec<DependencySpec>,
}

impl ModuleSpec {
    pub fn builder(identifier: ModuleIdentifier) -> ModuleSpecBuilder {
        ModuleSpecBuilder::new(identifier)
    }
}

#[derive(Default)]
pub struct ModuleSpecBuilder {
    identifier: Option<ModuleIdentifier>,
    main_class: Option<String>,
    resource_roots: Vec<Arc<dyn ResourceLoader>>,
    dependencies: Vec<DependencySpec>,
}

impl ModuleSpecBuilder {
    pub fn new(identifier: ModuleIdentifier) -> Self {
        Self {
            identifier: Some(identifier),
            ..Default::default()
        }
    }

    pub fn main_class(mut self, name: impl Into<String>) -> Self {
        self.main_class = Some(name.into());
        self
    }

    pub fn add_resource_root(mut self, root: Arc<dyn ResourceLoader>) -> Self {
        self.resource_roots.push(root);
        self
    }

    pub fn add_dependency(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn build(self) -> ModuleSpec {
        ModuleSpec {
            identifier: self.identifier.expect("ModuleSpecBuilder requires an identifier"),
            main_class: self.main_class,
            resource_roots: self.resource_roots,
            dependencies: self.dependencies,
        }
    }
}

/// A builder-side dependency description. Two variants, matching spec
/// §3's `LocalDependencySpec` / `ModuleDependencySpec`. Both filters
/// default as the spec requires: `acceptAll` for import, `rejectAll` for
/// export (invariant 4: never null, so these are plain `PathFilter`
/// values, not `Option`).
#[derive(Debug, Clone)]
pub enum DependencySpec {
    Local {
        /// `None` means "this module's own resources" (spec §4.3/§9
        /// open question).
        local_loader: Option<Arc<dyn LocalLoader>>,
        import_filter: PathFilter,
        export_filter: PathFilter,
    },
    Module {
        /// `None` means "use this module's owning loader".
        module_loader: Option<Arc<ModuleLoader>>,
        identifier: ModuleIdentifier,
        optional: bool,
        import_filter: PathFilter,
        export_filter: PathFilter,
    },
}

impl DependencySpec {
    /// A dependency on this module's own resources (spec §3 "the handling
    /// of paths in that case is implicit" / SPEC_FULL.md §9). Its export
    /// filter defaults to `acceptAll`, not the generic `rejectAll` a
    /// `ModuleDependencySpec` defaults to: a module's own content is what
    /// dependents are depending on *for*, so it is visible to them unless
    /// a resource root's own `<exports>` filter narrows it (spec §6). The
    /// generic `rejectAll` default instead governs whether a *transitive*
    /// module dependency gets re-exported, which is what the descriptor
    /// grammar's per-`<module>` `export` attribute (§6) actually controls.
    pub fn local() -> Self {
        DependencySpec::Local {
            local_loader: None,
            import_filter: PathFilter::accept_all(),
            export_filter: PathFilter::accept_all(),
        }
    }

    pub fn local_with(loader: Arc<dyn LocalLoader>) -> Self {
        DependencySpec::Local {
            local_loader: Some(loader),
            import_filter: PathFilter::accept_all(),
            export_filter: PathFilter::accept_all(),
        }
    }

    pub fn module(identifier: ModuleIdentifier) -> Self {
        DependencySpec::Module {
            module_loader: None,
            identifier,
            optional: false,
            import_filter: PathFilter::accept_all(),
            export_filter: PathFilter::reject_all(),
        }
    }

    pub fn optional(mut self) -> Self {
        if let DependencySpec::Module { optional, .. } = &mut self {
            *optional = true;
        }
        self
    }

    pub fn exported(self) -> Self {
        self.with_export_filter(PathFilter::accept_all())
    }

    pub fn with_import_filter(mut self, filter: PathFilter) -> Self {
        match &mut self {
            DependencySpec::Local { import_filter, .. }
            | DependencySpec::Module { import_filter, .. } => *import_filter = filter,
        }
        self
    }

    pub fn with_export_filter(mut self, filter: PathFilter) -> Self {
        match &mut self {
            DependencySpec::Local { export_filter, .. }
            | DependencySpec::Module { export_filter, .. } => *export_filter = filter,
        }
        self
    }

    pub fn with_loader(mut self, loader: Arc<ModuleLoader>) -> Self {
        if let DependencySpec::Module { module_loader, .. } = &mut self {
            *module_loader = Some(loader);
        }
        self
    }
}
