//! Trait seams between the registry and the watch machinery.

use crate::error::Result;
use crate::kind::{NamespaceScope, ResourceKind};
use crate::object::StoredObject;
use crate::store::{ObjectStore, WatchEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Probe reporting whether one cache has finished its initial sync.
pub type SyncProbe = Box<dyn Fn() -> bool + Send + Sync>;

/// One synchronizing cache, mirroring a single resource kind into a local
/// store.
#[async_trait]
pub trait WatchCache: Send + Sync {
    /// Drive the list-then-watch loop until `stop` fires.
    async fn run(&self, stop: CancellationToken);

    /// Check if the local store reflects a complete initial listing.
    fn has_synced(&self) -> bool;

    /// The local store this cache maintains.
    fn store(&self) -> Arc<dyn ObjectStore>;
}

/// Builds watch caches on demand, one per resource kind.
///
/// Construction must not perform the listing itself; that happens inside
/// [`WatchCache::run`]. A failure here means the kind cannot be served at
/// all, and the registry surfaces it to the caller without retrying.
pub trait WatchCacheFactory: Send + Sync {
    fn create(&self, kind: &ResourceKind, scope: &NamespaceScope) -> Result<Arc<dyn WatchCache>>;
}

/// Source of listing and change data for one kind, standing in for the
/// wire-level list-and-watch protocol. Reconnection and backoff belong
/// behind this trait, not to the registry.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Fetch the complete current state.
    async fn initial_list(&mut self) -> Result<Vec<StoredObject>>;

    /// Next incremental change; `Ok(None)` when the stream ends.
    async fn next_event(&mut self) -> Result<Option<WatchEvent>>;
}
