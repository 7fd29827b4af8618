use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::model::Ms;

/// How often the compactor checks the append count.
const COMPACT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest sweep period; a zero period would panic `tokio::time::interval`.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// One pass of the periodic sweeps. Returns (completed, expired).
pub async fn sweep_once(engine: &Engine, pending_ttl_ms: Ms) -> (usize, usize) {
    let completed = match engine.complete_finished_stays().await {
        Ok(n) => n,
        Err(e) => {
            warn!("completion sweep failed: {e}");
            0
        }
    };
    let expired = match engine.expire_stale_pending(pending_ttl_ms).await {
        Ok(n) => n,
        Err(e) => {
            warn!("pending expiry sweep failed: {e}");
            0
        }
    };
    if completed + expired > 0 {
        info!("sweep: {completed} stays completed, {expired} stale pending bookings expired");
    } else {
        debug!("sweep: nothing to do");
    }
    (completed, expired)
}

/// Persist derived booking transitions every `interval`, at least
/// `MIN_SWEEP_INTERVAL`.
pub async fn run_sweeper(engine: Arc<Engine>, interval: Duration, pending_ttl_ms: Ms) {
    if interval < MIN_SWEEP_INTERVAL {
        warn!("sweep interval {interval:?} too short, using {MIN_SWEEP_INTERVAL:?}");
    }
    let mut ticker = tokio::time::interval(interval.max(MIN_SWEEP_INTERVAL));
    loop {
        ticker.tick().await;
        sweep_once(&engine, pending_ttl_ms).await;
    }
}

/// Compact the WAL once `threshold` appends have accumulated since the last
/// compaction.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut ticker = tokio::time::interval(COMPACT_CHECK_INTERVAL);
    loop {
        ticker.tick().await;
        let appends = engine.wal_appends_since_compact().await;
        if appends < threshold {
            continue;
        }
        match engine.compact_wal().await {
            Ok(()) => info!("WAL compacted after {appends} appends"),
            Err(e) => warn!("WAL compaction failed: {e}"),
        }
    }
}
