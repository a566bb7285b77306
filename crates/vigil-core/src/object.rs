//! Object identity, stored representations, and request classification.
//!
//! One store type serves both registries: payloads are type-erased behind
//! [`StoredObject`], with [`DynamicObject`] as the schema-less payload on the
//! dynamic side and arbitrary compiled-in types on the typed side.

use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Identity of one object within a kind: optional namespace plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Key for a cluster-scoped object.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Key for a namespaced object.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One cached object: identity, kind, revision, and a shared opaque payload.
///
/// Cloning is cheap; the payload is shared, never copied.
#[derive(Clone)]
pub struct StoredObject {
    key: ObjectKey,
    kind: ResourceKind,
    revision: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl StoredObject {
    /// Wrap a payload of any concrete type.
    pub fn new<T: Any + Send + Sync>(
        kind: ResourceKind,
        key: ObjectKey,
        revision: impl Into<String>,
        payload: T,
    ) -> Self {
        Self {
            key,
            kind,
            revision: revision.into(),
            payload: Arc::new(payload),
        }
    }

    /// Wrap a dynamic object, taking identity and revision from it.
    pub fn from_dynamic(object: DynamicObject) -> Self {
        let kind = object.kind.clone();
        let key = object.key.clone();
        let revision = object.revision.clone();
        Self::new(kind, key, revision, object)
    }

    /// The object's identity.
    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    /// The kind this object belongs to.
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Revision of the remote state this object was taken from.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Downcast the payload to its concrete type.
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

/// Schema-less object representation carrying raw JSON data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicObject {
    pub kind: ResourceKind,
    pub key: ObjectKey,
    pub revision: String,
    pub data: serde_json::Value,
}

/// List counterpart of [`DynamicObject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicList {
    pub kind: ResourceKind,
    pub items: Vec<DynamicObject>,
}

/// Runtime identity of a compiled-in payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for the type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// How a requested object is represented. Computed per call from the sample
/// the caller passes, never stored; selects which registry serves the
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Typed,
    Dynamic,
    DynamicList,
}

/// Sample object accompanying a cache request.
#[derive(Debug, Clone)]
pub enum SampleObject {
    /// A compiled-in payload type.
    Typed(TypeToken),
    /// A schema-less single object.
    Dynamic(DynamicObject),
    /// A schema-less list.
    DynamicList(DynamicList),
}

impl SampleObject {
    /// Sample for the compiled-in type `T`.
    pub fn typed<T: Any>() -> Self {
        SampleObject::Typed(TypeToken::of::<T>())
    }

    /// Classify this sample. Pure and total: every sample maps to exactly
    /// one representation.
    pub fn representation(&self) -> Representation {
        match self {
            SampleObject::Typed(_) => Representation::Typed,
            SampleObject::Dynamic(_) => Representation::Dynamic,
            SampleObject::DynamicList(_) => Representation::DynamicList,
        }
    }
}
