//! Watch cache that mirrors an event feed into a memory store.

use super::traits::{EventFeed, WatchCache};
use crate::kind::ResourceKind;
use crate::store::{MemoryStore, ObjectStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The bundled watch-cache implementation: one initial listing, then
/// incremental events, all applied to an owned [`MemoryStore`].
///
/// The feed is owned exclusively by the run loop. A feed failure or stream
/// end stops the loop without clearing the store; reconnecting is the feed
/// implementation's business.
pub struct MirrorCache {
    kind: ResourceKind,
    feed: Mutex<Box<dyn EventFeed>>,
    store: Arc<MemoryStore>,
    synced: watch::Sender<bool>,
}

impl MirrorCache {
    /// Create a cache for `kind` backed by `feed`.
    pub fn new(kind: ResourceKind, feed: Box<dyn EventFeed>) -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            kind,
            feed: Mutex::new(feed),
            store: Arc::new(MemoryStore::new()),
            synced,
        }
    }

    /// The kind this cache mirrors.
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }
}

#[async_trait]
impl WatchCache for MirrorCache {
    async fn run(&self, stop: CancellationToken) {
        let mut feed = self.feed.lock().await;

        let listing = tokio::select! {
            biased;
            _ = stop.cancelled() => return,
            listing = feed.initial_list() => match listing {
                Ok(listing) => listing,
                Err(err) => {
                    warn!(kind = %self.kind, error = %err, "initial listing failed");
                    return;
                }
            },
        };
        self.store.replace(listing);
        self.synced.send_replace(true);
        debug!(kind = %self.kind, objects = self.store.len(), "initial sync complete");

        loop {
            let event = tokio::select! {
                biased;
                _ = stop.cancelled() => return,
                event = feed.next_event() => event,
            };
            match event {
                Ok(Some(event)) => self.store.apply(event),
                Ok(None) => {
                    debug!(kind = %self.kind, "watch stream ended");
                    return;
                }
                Err(err) => {
                    warn!(kind = %self.kind, error = %err, "watch stream failed");
                    return;
                }
            }
        }
    }

    fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }

    fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }
}
