//! Single consumer of the sample channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::sample::Sample;
use crate::sink::MetricSink;

/// Sample rate used for every increment (always sampled).
pub const SAMPLE_RATE: f64 = 1.0;

/// Counters for the dispatcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u64,
    pub failed: u64,
}

/// Forwards every sample from the channel to the sink, one call per sample.
pub struct Dispatcher {
    sink: Arc<dyn MetricSink>,
    samples: mpsc::Receiver<Sample>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn MetricSink>, samples: mpsc::Receiver<Sample>) -> Self {
        Self { sink, samples }
    }

    /// Consume samples until every sender is dropped and the channel is drained.
    ///
    /// A failed send is logged and the sample dropped; it never ends the loop.
    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        tracing::info!("Dispatcher started");

        while let Some(sample) = self.samples.recv().await {
            match self
                .sink
                .increment(&sample.name, sample.value, SAMPLE_RATE)
                .await
            {
                Ok(()) => {
                    stats.sent += 1;
                    tracing::debug!(sample = %sample, "Sample sent");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(sample = %sample, error = %e, "Failed to send sample");
                }
            }
        }

        tracing::info!(sent = stats.sent, failed = stats.failed, "Dispatcher stopped");
        stats
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
