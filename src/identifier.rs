//! `ModuleIdentifier`: the structural `group:artifact[:slot]` triple (spec §3).

use std::fmt;
use std::str::FromStr;

/// Structural name of a module. Equality and hashing are purely
/// structural over the three fields — no normalization beyond what
/// `new`/`parse` already perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentifier {
    group: String,
    artifact: String,
    slot: Option<String>,
}

impl ModuleIdentifier {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        slot: Option<String>,
    ) -> Result<Self, IdentifierError> {
        let group = group.into();
        let artifact = artifact.into();

        if group.is_empty() {
            return Err(IdentifierError::EmptyComponent("group"));
        }
        if artifact.is_empty() {
            return Err(IdentifierError::EmptyComponent("artifact"));
        }
        if let Some(slot) = &slot {
            if slot.is_empty() {
                return Err(IdentifierError::EmptyComponent("slot"));
            }
        }

        Ok(Self {
            group,
            artifact,
            slot,
        })
    }

    /// Constructs an identifier with no `slot` component, for the common
    /// case of a dependency descriptor that omits it (spec §9 "Open
    /// questions": `slot` is optional).
    pub fn unslotted(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            slot: None,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(slot) = &self.slot {
            write!(f, ":{slot}")?;
        }
        Ok(())
    }
}

impl FromStr for ModuleIdentifier {
    type Err = IdentifierError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.splitn(3, ':');
        let group = parts.next().unwrap_or("");
        let artifact = parts
            .next()
            .ok_or_else(|| IdentifierError::Malformed(text.to_string()))?;
        let slot = parts.next().map(str::to_string);

        if parts.next().is_some() {
            return Err(IdentifierError::Malformed(text.to_string()));
        }

        Self::new(group, artifact, slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("module identifier '{0}' is not of the form group:artifact[:slot]")]
    Malformed(String),

    #[error("module identifier has an empty {0} component")]
    EmptyComponent(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_artifact() {
        let id: ModuleIdentifier = "org.acme:widgets".parse().unwrap();
        assert_eq!(id.group(), "org.acme");
        assert_eq!(id.artifact(), "widgets");
        assert_eq!(id.slot(), None);
        assert_eq!(id.to_string(), "org.acme:widgets");
    }

    #[test]
    fn parses_with_slot() {
        let id: ModuleIdentifier = "org.acme:widgets:debug".parse().unwrap();
        assert_eq!(id.slot(), Some("debug"));
        assert_eq!(id.to_string(), "org.acme:widgets:debug");
    }

    #[test]
    fn rejects_missing_artifact() {
        assert!("org.acme".parse::<ModuleIdentifier>().is_err());
    }

    #[test]
    fn rejects_too_many_components() {
        assert!("a:b:c:d".parse::<ModuleIdentifier>().is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a: ModuleIdentifier = "a:b:c".parse().unwrap();
        let b: ModuleIdentifier = "a:b:c".parse().unwrap();
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
