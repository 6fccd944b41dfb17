//! `Namespace` (spec §4.5): per-module symbol and resource resolution.
//!
//! Every query family has a *local-or-all* variant (`load_symbol`,
//! `get_resource(s)`) that walks this module's own content then its
//! imports, and a *global* variant (`load_exported_symbol`,
//! `get_exported_resource(s)`) that instead walks the target's
//! `exportedPaths`, i.e. "what would a consumer of this module see."
//! Each public entry point starts a fresh visited-module set; a module
//! revisited mid-traversal is treated as not-found rather than recursed
//! into again, which is what keeps a cyclic module graph (spec §8
//! scenario 6) from looping forever.

use crate::dependency::DependencyKind;
use crate::error::ModuleResult;
use crate::identifier::ModuleIdentifier;
use crate::module::Module;
use crate::path::{resource_container_path, symbol_container_path};
use crate::resource::{Resource, Symbol};
use std::collections::HashSet;
use std::sync::{Arc, Weak};

pub struct Namespace<'a> {
    module: &'a Arc<Module>,
}

impl<'a> Namespace<'a> {
    pub fn new(module: &'a Arc<Module>) -> Self {
        Self { module }
    }

    pub fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        let mut visited = HashSet::new();
        load_symbol(self.module, name, &mut visited)
    }

    pub fn load_exported_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        let mut visited = HashSet::new();
        load_exported_symbol(self.module, name, &mut visited)
    }

    pub fn get_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        let mut visited = HashSet::new();
        get_resource(self.module, path, &mut visited)
    }

    pub fn get_resources(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        let mut visited = HashSet::new();
        get_resources(self.module, path, &mut visited)
    }

    pub fn get_exported_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        let mut visited = HashSet::new();
        get_exported_resource(self.module, path, &mut visited)
    }

    pub fn get_exported_resources(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        let mut visited = HashSet::new();
        get_exported_resources(self.module, path, &mut visited)
    }
}

fn enter(module: &Arc<Module>, visited: &mut HashSet<ModuleIdentifier>) -> bool {
    visited.insert(module.identifier().clone())
}

fn load_symbol(
    module: &Arc<Module>,
    name: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Option<Symbol>> {
    let path = symbol_container_path(name);
    if !enter(module, visited) {
        return Ok(None);
    }

    for dep in module.dependencies().iter() {
        if !dep.import_filter.matches(&path) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                if let Some(symbol) = local.load_symbol_local(name)? {
                    return Ok(Some(symbol));
                }
            }
            DependencyKind::Module(weak) => {
                let Some(target) = target_of(weak) else {
                    continue;
                };
                if let Some(symbol) = load_exported_symbol(&target, name, visited)? {
                    return Ok(Some(symbol));
                }
            }
        }
    }
    Ok(None)
}

fn load_exported_symbol(
    module: &Arc<Module>,
    name: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Option<Symbol>> {
    let path = symbol_container_path(name);
    if !enter(module, visited) {
        return Ok(None);
    }

    let exported = module.link_exports(&mut HashSet::new())?;
    let Some(candidates) = exported.get(&path) else {
        return Ok(None);
    };

    for dep in candidates {
        if !dep.export_filter.matches(&path) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                if let Some(symbol) = local.load_symbol_local(name)? {
                    return Ok(Some(symbol));
                }
            }
            DependencyKind::Module(weak) => {
                let Some(target) = target_of(weak) else {
                    continue;
                };
                if let Some(symbol) = load_exported_symbol(&target, name, visited)? {
                    return Ok(Some(symbol));
                }
            }
        }
    }
    Ok(None)
}

fn get_resource(
    module: &Arc<Module>,
    path: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Option<Resource>> {
    if !enter(module, visited) {
        return Ok(None);
    }
    let container = resource_container_path(path);

    for dep in module.dependencies().iter() {
        if !dep.import_filter.matches(&container) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                if let Some(resource) = local.load_resource_local(path)? {
                    return Ok(Some(resource));
                }
            }
            DependencyKind::Module(weak) => {
                let Some(target) = target_of(weak) else {
                    continue;
                };
                if let Some(resource) = get_exported_resource(&target, path, visited)? {
                    return Ok(Some(resource));
                }
            }
        }
    }
    Ok(None)
}

fn get_exported_resource(
    module: &Arc<Module>,
    path: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Option<Resource>> {
    if !enter(module, visited) {
        return Ok(None);
    }
    let container = resource_container_path(path);

    let exported = module.link_exports(&mut HashSet::new())?;
    let Some(candidates) = exported.get(&container) else {
        return Ok(None);
    };

    for dep in candidates {
        if !dep.export_filter.matches(&container) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                if let Some(resource) = local.load_resource_local(path)? {
                    return Ok(Some(resource));
                }
            }
            DependencyKind::Module(weak) => {
                let Some(target) = target_of(weak) else {
                    continue;
                };
                if let Some(resource) = get_exported_resource(&target, path, visited)? {
                    return Ok(Some(resource));
                }
            }
        }
    }
    Ok(None)
}

/// Enumerating form: unlike `get_resource`, collects from every candidate
/// dependency in traversal order rather than stopping at the first hit
/// (spec §4.5).
fn get_resources(
    module: &Arc<Module>,
    path: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Vec<Resource>> {
    if !enter(module, visited) {
        return Ok(Vec::new());
    }
    let container = resource_container_path(path);

    let mut found = Vec::new();
    for dep in module.dependencies().iter() {
        if !dep.import_filter.matches(&container) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                found.extend(local.load_resources_local(path)?);
            }
            DependencyKind::Module(weak) => {
                if let Some(target) = target_of(weak) {
                    found.extend(get_exported_resources(&target, path, visited)?);
                }
            }
        }
    }
    Ok(found)
}

fn get_exported_resources(
    module: &Arc<Module>,
    path: &str,
    visited: &mut HashSet<ModuleIdentifier>,
) -> ModuleResult<Vec<Resource>> {
    if !enter(module, visited) {
        return Ok(Vec::new());
    }
    let container = resource_container_path(path);

    let exported = module.link_exports(&mut HashSet::new())?;
    let Some(candidates) = exported.get(&container) else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for dep in candidates {
        if !dep.export_filter.matches(&container) {
            continue;
        }
        match &dep.kind {
            DependencyKind::Local(local) => {
                found.extend(local.load_resources_local(path)?);
            }
            DependencyKind::Module(weak) => {
                if let Some(target) = target_of(weak) {
                    found.extend(get_exported_resources(&target, path, visited)?);
                }
            }
        }
    }
    Ok(found)
}

fn target_of(weak: &Option<Weak<Module>>) -> Option<Arc<Module>> {
    weak.as_ref().and_then(Weak::upgrade)
}
