//! Standard resource backends (spec §6 "Resource backends"): a directory
//! tree and an archive file, both exposing only the `ResourceLoader`
//! contract.

pub mod archive;
pub mod directory;

use crate::error::ModuleResult;
use crate::filter::PathFilter;
use crate::resource::{Resource, ResourceLoader, Symbol};
use crate::path::symbol_container_path;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub use archive::ArchiveResourceLoader;
pub use directory::DirectoryResourceLoader;

/// Restricts a wrapped `ResourceLoader` to the paths a filter accepts.
/// Used for a descriptor `<resource-root>`'s own `<exports>` filter (spec
/// §6), which narrows what that particular root contributes independent
/// of the dependency-level export filter applied at link time.
pub struct FilteredResourceLoader {
    inner: Arc<dyn ResourceLoader>,
    filter: PathFilter,
}

impl FilteredResourceLoader {
    pub fn new(inner: Arc<dyn ResourceLoader>, filter: PathFilter) -> Self {
        Self { inner, filter }
    }
}

impl fmt::Debug for FilteredResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredResourceLoader")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl ResourceLoader for FilteredResourceLoader {
    fn paths(&self) -> ModuleResult<HashSet<String>> {
        Ok(self
            .inner
            .paths()?
            .into_iter()
            .filter(|path| self.filter.matches(path))
            .collect())
    }

    fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        if !self.filter.matches(&symbol_container_path(name)) {
            return Ok(None);
        }
        self.inner.load_symbol(name)
    }

    fn load_resource(&self, path: &str) -> ModuleResult<Option<Resource>> {
        if !self.filter.matches(path) {
            return Ok(None);
        }
        self.inner.load_resource(path)
    }

    fn load_resources(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        if !self.filter.matches(path) {
            return Ok(Vec::new());
        }
        self.inner.load_resources(path)
    }
}
