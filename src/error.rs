//! Error kinds for the module linker (spec §7).

use crate::identifier::ModuleIdentifier;
use std::path::PathBuf;

pub type ModuleResult<T> = Result<T, ModuleError>;

/// Errors the linker itself can raise. Symbol and resource visibility
/// misses are *not* represented here — callers get `Ok(None)` for those;
/// see `Namespace`.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("module '{0}' not found")]
    NotFound(ModuleIdentifier),

    #[error("findModule returned a spec for '{found}' when '{requested}' was requested")]
    NameMismatch {
        requested: ModuleIdentifier,
        found: ModuleIdentifier,
    },

    #[error("module '{0}' was already defined for this loader")]
    DuplicateDefinition(ModuleIdentifier),

    #[error("invalid descriptor at {location}: {reason}")]
    InvalidDescriptor { location: String, reason: String },

    #[error("administrative operation denied: redefine capability not held")]
    PermissionDenied,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed descriptor XML: {0}")]
    Xml(String),

    #[error("archive error at {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Surfaced to threads that were waiting on another thread's definition
    /// of `identifier` when that definition failed; `reason` is the
    /// `Display` of the original error, since `ModuleError` is not `Clone`.
    #[error("definition of module '{identifier}' failed: {reason}")]
    DefinitionFailed {
        identifier: ModuleIdentifier,
        reason: String,
    },
}

impl ModuleError {
    pub fn invalid_descriptor(location: impl Into<String>, reason: impl Into<String>) -> Self {
        ModuleError::InvalidDescriptor {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModuleError::Archive {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
