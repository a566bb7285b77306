//! Mapping from compiled-in payload types to resource kinds.

use crate::kind::ResourceKind;
use crate::object::TypeToken;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Catalog of compiled-in payload types and the resource kinds they map to.
///
/// Populated during setup, then shared read-only. The dispatcher consults it
/// to resolve the kind behind a typed lookup.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    kinds: HashMap<TypeId, ResourceKind>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the kind served by payload type `T`. Re-registering a type
    /// replaces its previous mapping.
    pub fn register<T: Any>(&mut self, kind: ResourceKind) -> &mut Self {
        self.kinds.insert(TypeId::of::<T>(), kind);
        self
    }

    /// The kind registered for `T`.
    pub fn kind_of<T: Any>(&self) -> Option<&ResourceKind> {
        self.kinds.get(&TypeId::of::<T>())
    }

    /// The kind registered for the type behind `token`.
    pub fn kind_of_token(&self, token: &TypeToken) -> Option<&ResourceKind> {
        self.kinds.get(&token.id())
    }

    /// Check if `T` has a registered kind.
    pub fn contains<T: Any>(&self) -> bool {
        self.kinds.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
