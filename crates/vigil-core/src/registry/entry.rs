//! One registered watch cache and its start bookkeeping.

use crate::kind::ResourceKind;
use crate::store::ObjectStore;
use crate::sync::{SyncProbe, WatchCache};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One watch cache registered under a kind.
///
/// The run loop launches at most once, from whichever side reaches it first:
/// the creation path when the registry is already running, or the registry's
/// start sweep. The stop token is a child of the registry's shutdown token,
/// so removing one entry stops only that entry while registry shutdown still
/// reaches everyone.
pub struct CacheEntry {
    kind: ResourceKind,
    cache: Arc<dyn WatchCache>,
    stop: CancellationToken,
    started: AtomicBool,
}

impl CacheEntry {
    pub(crate) fn new(
        kind: ResourceKind,
        cache: Arc<dyn WatchCache>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            kind,
            cache,
            stop,
            started: AtomicBool::new(false),
        }
    }

    /// The kind this entry serves.
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Check if the cache has completed its initial listing.
    pub fn has_synced(&self) -> bool {
        self.cache.has_synced()
    }

    /// Read access to the mirrored objects.
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.cache.store()
    }

    /// Probe usable for bulk sync waits without holding the entry.
    pub fn sync_probe(&self) -> SyncProbe {
        let cache = Arc::clone(&self.cache);
        Box::new(move || cache.has_synced())
    }

    /// Check if the run loop has been launched.
    pub(crate) fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Spawn the run loop. Later calls are no-ops.
    pub(crate) fn launch(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let kind = self.kind.clone();
        let cache = Arc::clone(&self.cache);
        let stop = self.stop.clone();
        tokio::spawn(async move {
            debug!(%kind, "watch cache running");
            cache.run(stop).await;
            debug!(%kind, "watch cache stopped");
        });
    }

    /// Cancel this entry's run loop.
    pub(crate) fn stop(&self) {
        self.stop.cancel();
    }
}
