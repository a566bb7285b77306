//! Local object stores kept current by watch streams.
//!
//! Each watch cache owns exactly one store. The cache's run loop applies the
//! initial listing and every incremental change; any number of consumers
//! read concurrently through [`ObjectStore`] without touching the registry.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{ObjectStore, WatchEvent};
