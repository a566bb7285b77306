//! Store read trait and the change events applied to stores.

use crate::object::{ObjectKey, StoredObject};

/// A change delivered by a watch stream after the initial listing.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A new object appeared.
    Added(StoredObject),
    /// An existing object changed; carries the new state.
    Updated(StoredObject),
    /// The object with this key is gone.
    Removed(ObjectKey),
}

/// Read access to the latest known objects of one kind.
///
/// Implementations must support concurrent reads; mutation is reserved for
/// the owning run loop.
pub trait ObjectStore: Send + Sync {
    /// Latest known state of the object with `key`, if any.
    fn get(&self, key: &ObjectKey) -> Option<StoredObject>;

    /// Snapshot of every object currently known.
    fn list(&self) -> Vec<StoredObject>;

    /// Number of objects currently known.
    fn len(&self) -> usize;

    /// Check if no objects are known.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
