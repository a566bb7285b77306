//! Watch-cache seams and the in-tree mirror implementation.
//!
//! The registry only depends on the traits here: a factory builds one
//! [`WatchCache`] per kind, and each cache reports readiness through sync
//! probes. [`MirrorCache`] is the bundled implementation, driven by an
//! [`EventFeed`] that stands in for the wire-level list-and-watch protocol.

mod mirror;
mod traits;
mod wait;

pub use mirror::MirrorCache;
pub use traits::{EventFeed, SyncProbe, WatchCache, WatchCacheFactory};
pub use wait::wait_for_sync;
