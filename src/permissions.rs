//! Administrative permission gate (spec §6 "Permissions gate (abstract)").
//!
//! Policy is delegated to the host environment; the engine only checks
//! `is_redefine_allowed` before running an administrative mutation.

use std::fmt;

pub trait RedefinePermission: fmt::Debug + Send + Sync {
    fn is_redefine_allowed(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RedefinePermission for AllowAll {
    fn is_redefine_allowed(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl RedefinePermission for DenyAll {
    fn is_redefine_allowed(&self) -> bool {
        false
    }
}

/// Wraps a host-supplied predicate, for a caller whose redefine policy is
/// more dynamic than a fixed allow/deny (e.g. "only in debug builds", "only
/// for this principal").
pub struct FnPermission<F>(F)
where
    F: Fn() -> bool + Send + Sync;

impl<F> FnPermission<F>
where
    F: Fn() -> bool + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self(check)
    }
}

impl<F> fmt::Debug for FnPermission<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPermission").finish_non_exhaustive()
    }
}

impl<F> RedefinePermission for FnPermission<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_redefine_allowed(&self) -> bool {
        (self.0)()
    }
}

/// Host-facing options a `ModuleLoader` is constructed with, mirroring the
/// teacher's `RegistryConfig` shape (`src/module/registry.rs`) but reduced
/// to the single capability spec §6 actually names: redefinition. Intended
/// to be deserialized from whatever configuration format embeds this
/// crate (TOML, JSON, environment) and then turned into a concrete
/// `RedefinePermission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoaderOptions {
    /// Whether administrative mutations (`relink`, `refreshResourceLoaders`,
    /// ...) are permitted on loaders built from these options.
    #[serde(default)]
    pub allow_redefine: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            allow_redefine: false,
        }
    }
}

impl RedefinePermission for LoaderOptions {
    fn is_redefine_allowed(&self) -> bool {
        self.allow_redefine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_grants() {
        assert!(AllowAll.is_redefine_allowed());
    }

    #[test]
    fn deny_all_refuses() {
        assert!(!DenyAll.is_redefine_allowed());
    }

    #[test]
    fn fn_permission_delegates_to_closure() {
        let allowed = std::sync::atomic::AtomicBool::new(false);
        let permission = FnPermission::new(|| allowed.load(std::sync::atomic::Ordering::SeqCst));
        assert!(!permission.is_redefine_allowed());
        allowed.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(permission.is_redefine_allowed());
    }

    #[test]
    fn loader_options_default_denies_redefine() {
        assert!(!LoaderOptions::default().is_redefine_allowed());
    }

    #[test]
    fn loader_options_round_trips_through_json() {
        let options = LoaderOptions {
            allow_redefine: true,
        };
        let json = serde_json::to_string(&options).unwrap();
        let parsed: LoaderOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
