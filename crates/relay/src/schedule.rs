use std::time::Duration;

use logrelay_buffer::BufferStore;
use logrelay_core::broker::StreamBroker;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::drain::Drainer;

/// Drives the drainer on a fixed period. The loop owns the drainer, and a
/// cycle that outlives its tick delays the next one rather than overlapping
/// it, so one buffer key is never drained by two cycles at once. Per-cycle
/// errors are logged and retried on the next tick; nothing escapes the loop.
pub async fn run_drain_loop<S, B>(mut drainer: Drainer<S, B>, period: Duration)
where
    S: BufferStore,
    B: StreamBroker,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match drainer.drain_once().await {
            Ok(report) if report.attempted == 0 => {}
            Ok(report) => info!(
                attempted = report.attempted,
                publish_failures = report.publish_failures,
                "drain cycle complete"
            ),
            Err(e) => warn!(error = ?e, "drain cycle failed; retrying on next tick"),
        }
    }
}
