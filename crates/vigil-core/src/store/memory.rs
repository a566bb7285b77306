//! In-memory store implementation.

use super::traits::{ObjectStore, WatchEvent};
use crate::object::{ObjectKey, StoredObject};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Hash-map store behind a read-write lock.
///
/// The owning run loop writes through [`replace`](MemoryStore::replace) and
/// [`apply`](MemoryStore::apply); consumers read through [`ObjectStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectKey, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire contents with an initial listing.
    pub fn replace(&self, objects: Vec<StoredObject>) {
        let mut map = self.objects.write();
        map.clear();
        for object in objects {
            map.insert(object.key().clone(), object);
        }
    }

    /// Apply one incremental change.
    pub fn apply(&self, event: WatchEvent) {
        let mut map = self.objects.write();
        match event {
            WatchEvent::Added(object) | WatchEvent::Updated(object) => {
                map.insert(object.key().clone(), object);
            }
            WatchEvent::Removed(key) => {
                map.remove(&key);
            }
        }
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, key: &ObjectKey) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    fn list(&self) -> Vec<StoredObject> {
        self.objects.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.objects.read().len()
    }
}
