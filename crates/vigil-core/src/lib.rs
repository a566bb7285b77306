//! Vigil - Per-kind watch caches over list-then-watch object stores.
//!
//! This crate keeps one read-optimized cache per resource kind. A cache is
//! created lazily on first lookup; it fills itself from an initial listing
//! and thereafter applies a stream of change events, so reads never hit the
//! upstream source. A [`CacheSet`] fronts two registries, one for strongly
//! typed representations and one for dynamic (schema-less) ones, dispatching
//! each request by the representation of its sample object.
//!
//! Concurrent first lookups of a kind construct exactly one cache, and each
//! cache's run loop launches at most once. Cancelling the shutdown token
//! stops every cache and makes further lookups fail fast.
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_core::{CacheSet, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> vigil_core::Result<()> {
//!     let set = CacheSet::builder(typed_factory, dynamic_factory)
//!         .register::<PodSpec>(ResourceKind::core("v1", "Pod"))
//!         .build();
//!     let set = std::sync::Arc::new(set);
//!
//!     let runner = set.clone();
//!     tokio::spawn(async move { runner.run().await });
//!
//!     // Blocks until the pod cache has completed its initial listing
//!     let pods = set.get_typed::<PodSpec>(true).await?;
//!     println!("Cached {} pods", pods.entry.store().len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod kind;
pub mod object;
pub mod registry;
pub mod schema;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use dispatch::{CacheSet, CacheSetBuilder};
pub use error::{Result, VigilError};
pub use kind::{NamespaceScope, ResourceKind};
pub use object::{
    DynamicList, DynamicObject, ObjectKey, Representation, SampleObject, StoredObject, TypeToken,
};
pub use registry::{CacheEntry, CacheMap, Lookup};
pub use schema::SchemaCatalog;
pub use store::{MemoryStore, ObjectStore, WatchEvent};
pub use sync::{wait_for_sync, EventFeed, MirrorCache, SyncProbe, WatchCache, WatchCacheFactory};
