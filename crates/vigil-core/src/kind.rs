//! Resource kind identifiers and namespace scoping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a kind of remote object: API group, version, and kind
/// name. Used as the registry lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl ResourceKind {
    /// Create a kind in the given API group.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Create a kind in the core (empty) API group.
    pub fn core(version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new("", version, kind)
    }

    /// Check if the kind lives in the core API group.
    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Which namespaces a registry watches. Fixed at construction and forwarded
/// to the watch-cache factory with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    /// Watch objects across every namespace.
    Cluster,
    /// Watch a single namespace.
    Namespaced(String),
}

impl NamespaceScope {
    /// The namespace name, when scoped to one.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            NamespaceScope::Cluster => None,
            NamespaceScope::Namespaced(namespace) => Some(namespace),
        }
    }
}

impl Default for NamespaceScope {
    fn default() -> Self {
        NamespaceScope::Cluster
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceScope::Cluster => write!(f, "cluster"),
            NamespaceScope::Namespaced(namespace) => write!(f, "namespace {}", namespace),
        }
    }
}
