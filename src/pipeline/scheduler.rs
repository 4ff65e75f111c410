//! Per-probe scheduling loop.

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::probe::Probe;
use crate::sample::Sample;
use crate::source::QueryExecutor;

/// Counters for one probe's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Timer ticks that started an execution.
    pub ticks: u64,
    /// Executions whose sample was handed to the dispatcher.
    pub succeeded: u64,
    /// Executions that failed and produced no sample.
    pub failed: u64,
}

/// Drive one probe until `stop` fires or the sample channel closes.
///
/// The first execution happens one full interval after the call. Executions
/// never overlap: the next tick is awaited only after the previous execution
/// finished, and ticks missed meanwhile are skipped.
pub(crate) async fn run_probe(
    probe: Probe,
    executor: QueryExecutor,
    samples: mpsc::Sender<Sample>,
    mut stop: watch::Receiver<bool>,
) -> ProbeStats {
    let mut stats = ProbeStats::default();
    let Some(first_tick) = Instant::now().checked_add(probe.interval) else {
        tracing::error!(
            interval = ?probe.interval,
            "Probe interval out of range, not scheduling"
        );
        return stats;
    };
    let mut ticker = tokio::time::interval_at(first_tick, probe.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(query = %probe.query, interval = ?probe.interval, "Probe started");

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }

        stats.ticks += 1;
        let started = std::time::Instant::now();

        match executor.execute(&probe).await {
            Ok(sample) => {
                tracing::debug!(
                    value = sample.value,
                    duration_ms = started.elapsed().as_millis(),
                    "Probe succeeded"
                );
                if samples.send(sample).await.is_err() {
                    tracing::warn!("Sample channel closed, stopping probe");
                    break;
                }
                stats.succeeded += 1;
            }
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(kind = e.kind(), error = %e, "Probe failed");
            }
        }
    }

    tracing::info!(
        ticks = stats.ticks,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Probe stopped"
    );
    stats
}
