//! `modlink`: the linker/resolver core of a modular code-loading runtime
//! (spec §1). Partitions a body of loadable code into named, versioned
//! modules, each with an isolated namespace, and resolves symbol and
//! resource lookups across an explicit dependency graph subject to
//! per-edge import/export visibility filters.
//!
//! The crate is organized bottom-up, leaves first, matching spec §2's
//! component table:
//!
//! - [`filter`] — the `PathFilter` algebra (§4.1).
//! - [`resource`] — `ResourceLoader` / `LocalLoader` contracts (§4.2).
//! - [`identifier`] — `ModuleIdentifier` (§3).
//! - [`spec`] — `ModuleSpec` / `DependencySpec`, the builder-side
//!   description of a module (§3).
//! - [`dependency`] — the materialized `Dependency` (§3/§4.3).
//! - [`module`] — `Module` and export linking (§4.4).
//! - [`namespace`] — per-module symbol/resource resolution (§4.5).
//! - [`registry`] — the concurrent, one-shot `ModuleLoader` registry
//!   (§4.3, §5).
//! - [`permissions`] — the administrative redefine-capability gate (§6).
//!
//! Two external collaborators the core spec draws at arm's length (§1,
//! §6) are still implemented, behind their own module boundary:
//!
//! - [`descriptor`] — the `urn:jboss:module:1.0` XML descriptor grammar.
//! - [`backends`] — a directory-tree and an archive-file `ResourceLoader`.

pub mod backends;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod module;
pub mod namespace;
pub mod path;
pub mod permissions;
pub mod registry;
pub mod resource;
pub mod spec;

pub use dependency::{Dependency, DependencyKind};
pub use error::{ModuleError, ModuleResult};
pub use filter::{GlobPattern, PathFilter, PathFilterBuilder};
pub use identifier::{IdentifierError, ModuleIdentifier};
pub use module::Module;
pub use namespace::Namespace;
pub use permissions::{AllowAll, DenyAll, FnPermission, LoaderOptions, RedefinePermission};
pub use registry::{ModuleFinder, ModuleLoader};
pub use resource::{LocalLoader, Resource, ResourceLoader, Symbol};
pub use spec::{DependencySpec, ModuleSpec, ModuleSpecBuilder};
