//! `ResourceLoader` / `LocalLoader` contracts (spec §4.2).
//!
//! The core treats symbols and resources as opaque byte payloads; giving
//! them meaning (defining a class, say) is host-runtime integration and
//! explicitly out of scope (spec §1).

use crate::error::ModuleResult;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A symbol resolved by name, e.g. `org.acme.Widget`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub data: Arc<[u8]>,
}

/// A resource resolved by full path, e.g. `org/acme/widget.properties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: String,
    pub data: Arc<[u8]>,
}

/// An opaque source of content: a directory tree, an archive file, or
/// anything else that can enumerate paths and serve lookups by name.
pub trait ResourceLoader: fmt::Debug + Send + Sync {
    /// Directory-like keys this loader answers for, slash-separated, no
    /// leading slash.
    fn paths(&self) -> ModuleResult<HashSet<String>>;

    fn load_symbol(&self, name: &str) -> ModuleResult<Option<Symbol>>;

    fn load_resource(&self, path: &str) -> ModuleResult<Option<Resource>>;

    fn load_resources(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        Ok(self.load_resource(path)?.into_iter().collect())
    }
}

/// Wraps one or more `ResourceLoader`s behind the union of their paths,
/// answering local symbol/resource queries for a single module (spec
/// §4.2). Resolution tries each wrapped loader in order and returns the
/// first hit.
pub trait LocalLoader: fmt::Debug + Send + Sync {
    fn paths(&self) -> ModuleResult<HashSet<String>>;

    fn load_symbol_local(&self, name: &str) -> ModuleResult<Option<Symbol>>;

    fn load_resource_local(&self, path: &str) -> ModuleResult<Option<Resource>>;

    fn load_resources_local(&self, path: &str) -> ModuleResult<Vec<Resource>>;
}

/// The `LocalLoader` a `ModuleSpec`'s `resource_roots` are aggregated
/// into at module construction time.
#[derive(Debug)]
pub struct AggregateLocalLoader {
    roots: Vec<Arc<dyn ResourceLoader>>,
}

impl AggregateLocalLoader {
    pub fn new(roots: Vec<Arc<dyn ResourceLoader>>) -> Self {
        Self { roots }
    }
}

impl LocalLoader for AggregateLocalLoader {
    fn paths(&self) -> ModuleResult<HashSet<String>> {
        let mut all = HashSet::new();
        for root in &self.roots {
            all.extend(root.paths()?);
        }
        Ok(all)
    }

    fn load_symbol_local(&self, name: &str) -> ModuleResult<Option<Symbol>> {
        for root in &self.roots {
            if let Some(symbol) = root.load_symbol(name)? {
                return Ok(Some(symbol));
            }
        }
        Ok(None)
    }

    fn load_resource_local(&self, path: &str) -> ModuleResult<Option<Resource>> {
        for root in &self.roots {
            if let Some(resource) = root.load_resource(path)? {
                return Ok(Some(resource));
            }
        }
        Ok(None)
    }

    fn load_resources_local(&self, path: &str) -> ModuleResult<Vec<Resource>> {
        let mut all = Vec::new();
        for root in &self.roots {
            all.extend(root.load_resources(path)?);
        }
        Ok(all)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::InMemoryResourceLoader;
    use super::*;

    #[test]
    fn aggregate_tries_loaders_in_order() {
        let first = Arc::new(InMemoryResourceLoader::new().with_symbol("p.q.Foo", b"first".to_vec()));
        let second =
            Arc::new(InMemoryResourceLoader::new().with_symbol("p.q.Foo", b"second".to_vec()));
        let aggregate = AggregateLocalLoader::new(vec![first, second]);

        let found = aggregate.load_symbol_local("p.q.Foo").unwrap().unwrap();
        assert_eq!(&*found.data, b"first");
    }

    #[test]
    fn aggregate_unions_paths() {
        let first = Arc::new(InMemoryResourceLoader::new().with_symbol("p.q.Foo", b"x".to_vec()));
        let second = Arc::new(InMemoryResourceLoader::new().with_symbol("r.s.Bar", b"y".to_vec()));
        let aggregate = AggregateLocalLoader::new(vec![first, second]);

        let paths = aggregate.paths().unwrap();
        assert!(paths.contains("p/q"));
        assert!(paths.contains("r/s"));
    }
}
