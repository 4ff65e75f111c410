//! Metrics sink layer.
//!
//! - [`MetricSink`]: Pluggable "increment counter by value" client
//! - [`StatsdSink`]: StatsD over UDP, one socket per increment

mod statsd;

pub use statsd::{StatsdSink, counter_line};

use thiserror::Error;

/// Errors that can occur while sending one increment.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Resolving the sink address failed.
    #[error("failed to resolve sink address '{address}': {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The sink address resolved to nothing.
    #[error("sink address '{0}' resolved to no addresses")]
    NoAddress(String),

    /// Opening or connecting the socket failed.
    #[error("socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// Sending the packet failed.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),
}

/// Client for a counter-based metrics system.
#[async_trait::async_trait]
pub trait MetricSink: Send + Sync + 'static {
    /// Increment counter `name` by `value`.
    ///
    /// `sample_rate` is the fraction of events the caller actually reports;
    /// the sink uses it to scale the counter back up.
    async fn increment(&self, name: &str, value: i64, sample_rate: f64) -> Result<(), SinkError>;
}
