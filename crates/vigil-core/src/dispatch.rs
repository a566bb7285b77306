//! Front door over the typed and dynamic cache registries.
//!
//! A [`CacheSet`] owns two [`CacheMap`]s sharing one shutdown token and one
//! namespace scope. Requests carry a [`SampleObject`] whose representation
//! decides which registry serves them; strongly typed callers can skip the
//! sample and go through the schema catalog instead.

use crate::error::{Result, VigilError};
use crate::kind::{NamespaceScope, ResourceKind};
use crate::object::{Representation, SampleObject};
use crate::registry::{CacheMap, Lookup};
use crate::schema::SchemaCatalog;
use crate::sync::{wait_for_sync, WatchCacheFactory};
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Pair of cache registries, one for typed representations and one for
/// dynamic ones, behind a single dispatching surface.
pub struct CacheSet {
    typed: Arc<CacheMap>,
    dynamic: Arc<CacheMap>,
    schemas: Arc<SchemaCatalog>,
    shutdown: CancellationToken,
}

impl CacheSet {
    /// Start building a cache set from the two registry factories.
    pub fn builder(
        typed_factory: Arc<dyn WatchCacheFactory>,
        dynamic_factory: Arc<dyn WatchCacheFactory>,
    ) -> CacheSetBuilder {
        CacheSetBuilder::new(typed_factory, dynamic_factory)
    }

    /// Look up the cache for `kind` in the registry matching `sample`'s
    /// representation, creating it on first access.
    ///
    /// With `block_for_sync`, waits for the kind's initial listing before
    /// returning. See [`CacheMap::get`] for the shutdown behavior.
    pub async fn get(
        &self,
        kind: &ResourceKind,
        sample: &SampleObject,
        block_for_sync: bool,
    ) -> Result<Lookup> {
        self.registry_for(sample).get(kind, block_for_sync).await
    }

    /// Like [`get`](CacheSet::get) but never waits for the initial sync.
    pub async fn get_non_blocking(
        &self,
        kind: &ResourceKind,
        sample: &SampleObject,
    ) -> Result<Lookup> {
        self.get(kind, sample, false).await
    }

    /// Look up the typed cache for `T` through the schema catalog.
    pub async fn get_typed<T: Any>(&self, block_for_sync: bool) -> Result<Lookup> {
        let kind = self.schemas.kind_of::<T>().ok_or_else(|| {
            VigilError::construction(std::any::type_name::<T>(), "type has no registered kind")
        })?;
        self.typed.get(kind, block_for_sync).await
    }

    /// Stop and drop the cache for `kind` in the registry matching
    /// `sample`'s representation.
    pub fn remove(&self, kind: &ResourceKind, sample: &SampleObject) {
        self.registry_for(sample).remove(kind);
    }

    /// Launch both registries and park until shutdown fires.
    pub async fn run(&self) -> Result<()> {
        let typed = Arc::clone(&self.typed);
        tokio::spawn(async move { typed.run().await });
        let dynamic = Arc::clone(&self.dynamic);
        tokio::spawn(async move { dynamic.run().await });

        self.shutdown.cancelled().await;
        info!("cache set stopped");
        Ok(())
    }

    /// Wait until every cache registered in either registry has completed
    /// its initial sync. Returns false when shutdown fires first.
    ///
    /// The probe set is snapshotted before waiting for the registries to
    /// start, so kinds registered after this call begins are not covered.
    pub async fn wait_for_cache_sync(&self) -> bool {
        let mut probes = self.typed.sync_probes();
        probes.extend(self.dynamic.sync_probes());

        if !self.typed.wait_started().await {
            return false;
        }
        if !self.dynamic.wait_started().await {
            return false;
        }
        wait_for_sync(&self.shutdown, &probes).await
    }

    /// Catalog mapping Rust types to resource kinds.
    pub fn schemas(&self) -> &Arc<SchemaCatalog> {
        &self.schemas
    }

    /// Token that stops both registries and every cache when cancelled.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    fn registry_for(&self, sample: &SampleObject) -> &CacheMap {
        match sample.representation() {
            Representation::Typed => &self.typed,
            Representation::Dynamic | Representation::DynamicList => &self.dynamic,
        }
    }
}

/// Builder for [`CacheSet`].
pub struct CacheSetBuilder {
    typed_factory: Arc<dyn WatchCacheFactory>,
    dynamic_factory: Arc<dyn WatchCacheFactory>,
    schemas: SchemaCatalog,
    scope: NamespaceScope,
    shutdown: Option<CancellationToken>,
}

impl CacheSetBuilder {
    pub fn new(
        typed_factory: Arc<dyn WatchCacheFactory>,
        dynamic_factory: Arc<dyn WatchCacheFactory>,
    ) -> Self {
        Self {
            typed_factory,
            dynamic_factory,
            schemas: SchemaCatalog::new(),
            scope: NamespaceScope::default(),
            shutdown: None,
        }
    }

    /// Restrict every cache to `scope`.
    pub fn with_scope(mut self, scope: NamespaceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Replace the schema catalog wholesale.
    pub fn with_schemas(mut self, schemas: SchemaCatalog) -> Self {
        self.schemas = schemas;
        self
    }

    /// Map the Rust type `T` to `kind` for typed lookups.
    pub fn register<T: Any>(mut self, kind: ResourceKind) -> Self {
        self.schemas.register::<T>(kind);
        self
    }

    /// Stop the set from `shutdown` instead of an internally created token.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn build(self) -> CacheSet {
        let shutdown = self.shutdown.unwrap_or_default();
        let typed = Arc::new(CacheMap::new(
            self.typed_factory,
            self.scope.clone(),
            shutdown.clone(),
        ));
        let dynamic = Arc::new(CacheMap::new(
            self.dynamic_factory,
            self.scope.clone(),
            shutdown.clone(),
        ));
        CacheSet {
            typed,
            dynamic,
            schemas: Arc::new(self.schemas),
            shutdown,
        }
    }
}
