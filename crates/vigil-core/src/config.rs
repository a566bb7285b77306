//! Configuration constants for cache synchronization.

use std::time::Duration;

/// Timing for sync waits.
pub struct SyncConfig;

impl SyncConfig {
    /// Interval between probe checks while waiting for caches to sync.
    pub const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// How long a wait may run before it logs that caches are still behind.
    pub const SYNC_WARN_AFTER: Duration = Duration::from_secs(10);
}
