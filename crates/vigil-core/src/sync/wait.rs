//! Poll-based waiting on sync probes.

use super::traits::SyncProbe;
use crate::config::SyncConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Wait until every probe reports synced, or `cancel` fires.
///
/// Probes are checked immediately and then at a fixed interval, so a wait on
/// already-synced caches returns without sleeping. Returns false when
/// cancelled first. An empty probe set is trivially synced.
pub async fn wait_for_sync(cancel: &CancellationToken, probes: &[SyncProbe]) -> bool {
    let started = tokio::time::Instant::now();
    let mut warned = false;

    loop {
        if probes.iter().all(|synced| synced()) {
            return true;
        }
        if !warned && started.elapsed() >= SyncConfig::SYNC_WARN_AFTER {
            warn!(
                waited_secs = started.elapsed().as_secs(),
                "caches still not synced"
            );
            warned = true;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(SyncConfig::SYNC_POLL_INTERVAL) => {}
        }
    }
}
