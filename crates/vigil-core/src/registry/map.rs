//! Concurrency-safe mapping from resource kinds to running caches.

use super::entry::CacheEntry;
use crate::error::{Result, VigilError};
use crate::kind::{NamespaceScope, ResourceKind};
use crate::sync::{wait_for_sync, SyncProbe, WatchCacheFactory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of a registry lookup.
#[derive(Clone)]
pub struct Lookup {
    /// True when this call performed the creation.
    pub created: bool,
    /// Handle to the (possibly pre-existing) entry.
    pub entry: Arc<CacheEntry>,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup")
            .field("created", &self.created)
            .field("kind", self.entry.kind())
            .finish_non_exhaustive()
    }
}

/// Lazily-populated registry of watch caches, one per resource kind.
///
/// The map lock guards only membership: creation re-checks existence under
/// it, so concurrent first lookups of one kind construct a single cache.
/// Sync waits and run loops execute outside the lock. Shutdown propagates
/// through child tokens to every entry and makes further lookups fail fast.
pub struct CacheMap {
    factory: Arc<dyn WatchCacheFactory>,
    scope: NamespaceScope,
    shutdown: CancellationToken,
    entries: Mutex<HashMap<ResourceKind, Arc<CacheEntry>>>,
    started: watch::Sender<bool>,
}

impl CacheMap {
    /// Create a registry backed by `factory`, watching `scope`, stopping
    /// when `shutdown` fires.
    pub fn new(
        factory: Arc<dyn WatchCacheFactory>,
        scope: NamespaceScope,
        shutdown: CancellationToken,
    ) -> Self {
        let (started, _) = watch::channel(false);
        Self {
            factory,
            scope,
            shutdown,
            entries: Mutex::new(HashMap::new()),
            started,
        }
    }

    /// Look up the entry for `kind`, creating and scheduling it on first
    /// access.
    ///
    /// With `block_for_sync`, the call also waits until the kind's initial
    /// listing has landed, without holding the map lock. Shutdown aborts
    /// the wait with [`VigilError::SyncAborted`]; the entry stays registered
    /// and keeps synchronizing.
    pub async fn get(&self, kind: &ResourceKind, block_for_sync: bool) -> Result<Lookup> {
        if self.shutdown.is_cancelled() {
            return Err(VigilError::ShuttingDown);
        }

        let lookup = match self.find(kind) {
            Some(entry) => Lookup {
                created: false,
                entry,
            },
            None => self.create(kind)?,
        };

        if block_for_sync && !lookup.entry.has_synced() {
            let probe = lookup.entry.sync_probe();
            if !wait_for_sync(&self.shutdown, std::slice::from_ref(&probe)).await {
                return Err(VigilError::SyncAborted {
                    kind: kind.to_string(),
                });
            }
        }

        Ok(lookup)
    }

    /// Fast path: read-only lookup.
    fn find(&self, kind: &ResourceKind) -> Option<Arc<CacheEntry>> {
        self.entries.lock().get(kind).cloned()
    }

    /// Slow path: create under the map lock, re-checking shutdown and
    /// existence once the lock is held.
    fn create(&self, kind: &ResourceKind) -> Result<Lookup> {
        let mut entries = self.entries.lock();
        if self.shutdown.is_cancelled() {
            return Err(VigilError::ShuttingDown);
        }
        if let Some(entry) = entries.get(kind) {
            return Ok(Lookup {
                created: false,
                entry: Arc::clone(entry),
            });
        }

        let cache = self.factory.create(kind, &self.scope)?;
        let entry = Arc::new(CacheEntry::new(
            kind.clone(),
            cache,
            self.shutdown.child_token(),
        ));
        entries.insert(kind.clone(), Arc::clone(&entry));

        // Entries registered after the start sweep launch here; earlier
        // ones launch from `run`. Both paths read `started` under the map
        // lock, and `CacheEntry::launch` is idempotent besides.
        if *self.started.borrow() {
            entry.launch();
        }
        info!(%kind, "watch cache registered");

        Ok(Lookup {
            created: true,
            entry,
        })
    }

    /// Stop and drop the entry for `kind`.
    ///
    /// Acts only on entries that are present and started; anything else is
    /// a no-op, including an entry whose creation won the map lock just
    /// before this call.
    pub fn remove(&self, kind: &ResourceKind) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get(kind) else {
            return;
        };
        if !entry.was_started() {
            return;
        }
        entry.stop();
        entries.remove(kind);
        info!(%kind, "watch cache removed");
    }

    /// Launch every registered cache, mark the registry started, and park
    /// until shutdown fires. Entries registered while running launch from
    /// their creation path instead.
    pub async fn run(&self) {
        {
            let entries = self.entries.lock();
            for entry in entries.values() {
                entry.launch();
            }
            self.started.send_replace(true);
            info!(scope = %self.scope, caches = entries.len(), "cache registry running");
        }
        self.shutdown.cancelled().await;
        info!(scope = %self.scope, "cache registry stopped");
    }

    /// Wait until [`run`](CacheMap::run) has marked the registry started.
    /// Returns false when shutdown fires first.
    pub async fn wait_started(&self) -> bool {
        let mut started = self.started.subscribe();
        if *started.borrow_and_update() {
            return true;
        }
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return false,
                changed = started.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    if *started.borrow_and_update() {
                        return true;
                    }
                }
            }
        }
    }

    /// One sync probe per entry registered right now. Later registrations
    /// are not covered; callers snapshot again if they need them.
    pub fn sync_probes(&self) -> Vec<SyncProbe> {
        self.entries
            .lock()
            .values()
            .map(|entry| entry.sync_probe())
            .collect()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ObjectStore};
    use crate::sync::WatchCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Cache that reports synced once the shared gate opens. A held cache
    /// ignores the gate and never syncs.
    struct GatedCache {
        gate: Arc<AtomicBool>,
        runs: Arc<AtomicUsize>,
        synced: AtomicBool,
        held: bool,
        store: Arc<MemoryStore>,
    }

    #[async_trait]
    impl WatchCache for GatedCache {
        async fn run(&self, stop: CancellationToken) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.held {
                stop.cancelled().await;
                return;
            }
            loop {
                if self.gate.load(Ordering::SeqCst) {
                    self.synced.store(true, Ordering::SeqCst);
                    break;
                }
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_millis(10)) => {}
                }
            }
            stop.cancelled().await;
        }

        fn has_synced(&self) -> bool {
            self.synced.load(Ordering::SeqCst)
        }

        fn store(&self) -> Arc<dyn ObjectStore> {
            self.store.clone()
        }
    }

    struct TestFactory {
        created: AtomicUsize,
        runs: Arc<AtomicUsize>,
        gate: Arc<AtomicBool>,
        hold: AtomicBool,
        reject: Option<ResourceKind>,
    }

    impl TestFactory {
        fn new(gate_open: bool) -> Arc<Self> {
            Arc::new(Self {
                created: AtomicUsize::new(0),
                runs: Arc::new(AtomicUsize::new(0)),
                gate: Arc::new(AtomicBool::new(gate_open)),
                hold: AtomicBool::new(false),
                reject: None,
            })
        }

        fn rejecting(kind: ResourceKind) -> Arc<Self> {
            Arc::new(Self {
                created: AtomicUsize::new(0),
                runs: Arc::new(AtomicUsize::new(0)),
                gate: Arc::new(AtomicBool::new(true)),
                hold: AtomicBool::new(false),
                reject: Some(kind),
            })
        }

        fn release(&self) {
            self.gate.store(true, Ordering::SeqCst);
        }

        /// Caches created from here on never sync.
        fn hold_new_caches(&self) {
            self.hold.store(true, Ordering::SeqCst);
        }

        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    impl WatchCacheFactory for TestFactory {
        fn create(
            &self,
            kind: &ResourceKind,
            _scope: &NamespaceScope,
        ) -> Result<Arc<dyn WatchCache>> {
            if self.reject.as_ref() == Some(kind) {
                return Err(VigilError::construction(kind.to_string(), "kind not servable"));
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(GatedCache {
                gate: Arc::clone(&self.gate),
                runs: Arc::clone(&self.runs),
                synced: AtomicBool::new(false),
                held: self.hold.load(Ordering::SeqCst),
                store: Arc::new(MemoryStore::new()),
            }))
        }
    }

    fn pod_kind() -> ResourceKind {
        ResourceKind::core("v1", "Pod")
    }

    fn map_for(factory: &Arc<TestFactory>) -> (Arc<CacheMap>, CancellationToken) {
        let shutdown = CancellationToken::new();
        let map = Arc::new(CacheMap::new(
            Arc::clone(factory) as Arc<dyn WatchCacheFactory>,
            NamespaceScope::Cluster,
            shutdown.clone(),
        ));
        (map, shutdown)
    }

    fn spawn_run(map: &Arc<CacheMap>) -> tokio::task::JoinHandle<()> {
        let map = Arc::clone(map);
        tokio::spawn(async move { map.run().await })
    }

    async fn assert_started(map: &Arc<CacheMap>) {
        let started = tokio::time::timeout(Duration::from_secs(1), map.wait_started())
            .await
            .expect("wait_started timed out");
        assert!(started);
    }

    #[tokio::test]
    async fn test_get_creates_then_reuses() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);

        let first = map.get(&pod_kind(), false).await.unwrap();
        assert!(first.created);

        let second = map.get(&pod_kind(), false).await.unwrap();
        assert!(!second.created);
        assert!(Arc::ptr_eq(&first.entry, &second.entry));
        assert_eq!(factory.created(), 1);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_create_one_cache() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let map = Arc::clone(&map);
            handles.push(tokio::spawn(
                async move { map.get(&pod_kind(), false).await },
            ));
        }

        let mut created = 0;
        let mut entries = Vec::new();
        for result in futures::future::join_all(handles).await {
            let lookup = result.unwrap().unwrap();
            if lookup.created {
                created += 1;
            }
            entries.push(lookup.entry);
        }

        assert_eq!(created, 1);
        assert!(entries
            .windows(2)
            .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(factory.created(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(factory.runs(), 1);
    }

    #[tokio::test]
    async fn test_factory_failure_leaves_no_entry() {
        let factory = TestFactory::rejecting(pod_kind());
        let (map, _shutdown) = map_for(&factory);

        let err = map.get(&pod_kind(), false).await.unwrap_err();
        assert!(matches!(err, VigilError::Construction { .. }));
        assert!(map.is_empty());

        // Failures are not cached either; the next call asks the factory
        // again.
        let err = map.get(&pod_kind(), false).await.unwrap_err();
        assert!(matches!(err, VigilError::Construction { .. }));
    }

    #[tokio::test]
    async fn test_blocking_get_waits_for_sync() {
        let factory = TestFactory::new(false);
        let (map, _shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        let release = Arc::clone(&factory);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            release.release();
        });

        let lookup = map.get(&pod_kind(), true).await.unwrap();
        assert!(lookup.created);
        assert!(lookup.entry.has_synced());
    }

    #[tokio::test]
    async fn test_blocking_get_on_existing_entry_waits_too() {
        let factory = TestFactory::new(false);
        let (map, _shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        let first = map.get(&pod_kind(), false).await.unwrap();
        assert!(first.created);

        let release = Arc::clone(&factory);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            release.release();
        });

        let second = map.get(&pod_kind(), true).await.unwrap();
        assert!(!second.created);
        assert!(second.entry.has_synced());
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_blocking_get_aborts_on_shutdown() {
        let factory = TestFactory::new(false);
        let (map, shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = map.get(&pod_kind(), true).await.unwrap_err();
        assert!(err.is_sync_abort());
        // The entry survives the aborted wait.
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_started_then_recreate() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        let first = map.get(&pod_kind(), true).await.unwrap();
        assert!(first.created);

        map.remove(&pod_kind());
        assert!(map.is_empty());

        let fresh = map.get(&pod_kind(), false).await.unwrap();
        assert!(fresh.created);
        assert!(!Arc::ptr_eq(&first.entry, &fresh.entry));
        assert_eq!(factory.created(), 2);
    }

    #[tokio::test]
    async fn test_remove_unknown_kind_is_noop() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);

        map.remove(&pod_kind());
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_remove_before_start_keeps_entry() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);

        let lookup = map.get(&pod_kind(), false).await.unwrap();
        assert!(lookup.created);

        map.remove(&pod_kind());
        assert_eq!(map.len(), 1);
        assert_eq!(factory.runs(), 0);

        let again = map.get(&pod_kind(), false).await.unwrap();
        assert!(!again.created);
    }

    #[tokio::test]
    async fn test_get_after_shutdown_fails_fast() {
        let factory = TestFactory::new(true);
        let (map, shutdown) = map_for(&factory);

        shutdown.cancel();
        let err = map.get(&pod_kind(), false).await.unwrap_err();
        assert!(matches!(err, VigilError::ShuttingDown));
        assert!(map.is_empty());
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn test_entries_before_run_launch_on_start() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);

        map.get(&pod_kind(), false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(factory.runs(), 0);

        spawn_run(&map);
        assert_started(&map).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(factory.runs(), 1);
    }

    #[tokio::test]
    async fn test_wait_started_reports_cancellation() {
        let factory = TestFactory::new(true);
        let (map, shutdown) = map_for(&factory);

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        assert!(!map.wait_started().await);
    }

    #[tokio::test]
    async fn test_sync_probes_snapshot_current_entries() {
        let factory = TestFactory::new(true);
        let (map, _shutdown) = map_for(&factory);
        assert!(map.sync_probes().is_empty());

        map.get(&pod_kind(), false).await.unwrap();
        map.get(&ResourceKind::core("v1", "Node"), false)
            .await
            .unwrap();

        let probes = map.sync_probes();
        assert_eq!(probes.len(), 2);
        assert!(probes.iter().all(|synced| !synced()));

        spawn_run(&map);
        assert_started(&map).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(probes.iter().all(|synced| synced()));
    }

    #[tokio::test]
    async fn test_probe_snapshot_ignores_later_entries() {
        let factory = TestFactory::new(false);
        let (map, _shutdown) = map_for(&factory);
        spawn_run(&map);
        assert_started(&map).await;

        map.get(&pod_kind(), false).await.unwrap();
        let probes = map.sync_probes();
        assert_eq!(probes.len(), 1);

        // Registered after the snapshot, and never syncs.
        factory.hold_new_caches();
        let late = map
            .get(&ResourceKind::core("v1", "Node"), false)
            .await
            .unwrap();
        assert!(late.created);

        factory.release();
        let cancel = CancellationToken::new();
        let synced = tokio::time::timeout(Duration::from_secs(1), wait_for_sync(&cancel, &probes))
            .await
            .expect("snapshot wait timed out");
        assert!(synced);
        assert!(!late.entry.has_synced());

        // A fresh snapshot does pick the late entry up.
        assert_eq!(map.sync_probes().len(), 2);
    }
}
