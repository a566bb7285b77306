//! The per-kind cache registry.
//!
//! A [`CacheMap`] lazily creates one watch cache per resource kind, launches
//! each run loop at most once, and propagates shutdown to every entry.
//! Creation races resolve under the map lock; sync waiting never holds it,
//! so one kind's slow initial listing cannot serialize lookups of other
//! kinds.

mod entry;
mod map;

pub use entry::CacheEntry;
pub use map::{CacheMap, Lookup};
