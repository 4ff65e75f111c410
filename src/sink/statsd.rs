//! StatsD counter sink over UDP.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::config::SinkConfig;
use crate::sample::SEPARATOR;
use crate::sink::{MetricSink, SinkError};

/// Format a StatsD counter line.
///
/// The `|@rate` suffix is only written for rates below 1.0.
pub fn counter_line(prefix: &str, name: &str, value: i64, sample_rate: f64) -> String {
    let mut line = format!("{prefix}{name}{SEPARATOR}{value}|c");
    if sample_rate < 1.0 {
        line.push_str(&format!("|@{sample_rate}"));
    }
    line
}

/// Sends each increment from a freshly bound UDP socket.
///
/// The socket is dropped as soon as the packet is handed to the OS, so no
/// state is kept between increments.
#[derive(Debug, Clone)]
pub struct StatsdSink {
    address: String,
    prefix: String,
}

impl StatsdSink {
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            address: config.address(),
            prefix: config.prefix.clone(),
        }
    }

    /// `host:port` this sink sends to.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn resolve(&self) -> Result<SocketAddr, SinkError> {
        tokio::net::lookup_host(&self.address)
            .await
            .map_err(|source| SinkError::Resolve {
                address: self.address.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| SinkError::NoAddress(self.address.clone()))
    }
}

#[async_trait::async_trait]
impl MetricSink for StatsdSink {
    async fn increment(&self, name: &str, value: i64, sample_rate: f64) -> Result<(), SinkError> {
        let target = self.resolve().await?;
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await.map_err(SinkError::Socket)?;
        socket.connect(target).await.map_err(SinkError::Socket)?;

        let line = counter_line(&self.prefix, name, value, sample_rate);
        socket
            .send(line.as_bytes())
            .await
            .map_err(SinkError::Send)?;

        tracing::trace!(target_addr = %target, line = %line, "StatsD packet sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_counter_line() {
        assert_eq!(counter_line("", "q1", 1, 1.0), "q1:1|c");
        assert_eq!(counter_line("prod.", "q1", -5, 1.0), "prod.q1:-5|c");
        assert_eq!(counter_line("", "q1", 3, 0.5), "q1:3|c|@0.5");
    }

    #[test]
    fn test_sink_address_defaults() {
        let sink = StatsdSink::new(&SinkConfig::new("graph", 0));
        assert_eq!(sink.address(), "graph:8125");
    }

    #[tokio::test]
    async fn test_statsd_sink_sends_packet() {
        let receiver = match UdpSocket::bind("127.0.0.1:0").await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                // Some sandboxed environments disallow binding; skip the test.
                return;
            }
            Err(e) => panic!("Failed to bind test receiver: {e}"),
        };
        let port = receiver.local_addr().unwrap().port();

        let mut config = SinkConfig::new("127.0.0.1", port);
        config.prefix = "mambo.".to_string();
        let sink = StatsdSink::new(&config);

        sink.increment("mysql.server.query1", 42, 1.0).await.unwrap();

        let mut buf = [0u8; 512];
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .expect("no packet received")
            .unwrap();
        assert_eq!(&buf[..len], b"mambo.mysql.server.query1:42|c");
    }

    #[tokio::test]
    async fn test_statsd_sink_unresolvable_host() {
        let sink = StatsdSink::new(&SinkConfig::new("no-such-host.invalid", 8125));

        let err = sink.increment("q1", 1, 1.0).await.unwrap_err();
        assert!(
            matches!(err, SinkError::Resolve { .. } | SinkError::NoAddress(_)),
            "unexpected error: {err}"
        );
    }
}
