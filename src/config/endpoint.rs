//! Data source and metrics sink connection parameters.

use serde::{Deserialize, Serialize};

use super::validation::{ConfigError, expand_env_vars};

/// MySQL port used when none is configured.
pub const DEFAULT_SOURCE_PORT: u16 = 3306;

/// StatsD port used when none is configured.
pub const DEFAULT_SINK_PORT: u16 = 8125;

/// Unix socket used in local-socket mode when none is configured.
pub const DEFAULT_SOURCE_SOCKET: &str = "/var/run/mysqld/mysqld.sock";

fn default_socket() -> String {
    DEFAULT_SOURCE_SOCKET.to_string()
}

/// Map the "not configured" port value to the given default.
pub fn port_or_default(port: u16, default: u16) -> u16 {
    if port == 0 { default } else { port }
}

/// Connection parameters for the data source.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Server host. Empty selects local-socket mode.
    #[serde(default)]
    pub host: String,

    /// Server port (0 or absent: 3306). Ignored in local-socket mode.
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub database: String,

    /// Socket path used when `host` is empty.
    #[serde(default = "default_socket")]
    pub socket: String,

    /// Shared connection pool size. One connection per execution when absent.
    #[serde(default)]
    pub pool_size: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            socket: default_socket(),
            pool_size: None,
        }
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("socket", &self.socket)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl SourceConfig {
    /// True when no host is configured and the Unix socket is used.
    pub fn is_local_socket(&self) -> bool {
        self.host.is_empty()
    }

    /// Effective port after default substitution.
    pub fn resolved_port(&self) -> u16 {
        port_or_default(self.port, DEFAULT_SOURCE_PORT)
    }

    /// Data source name.
    ///
    /// `user:password@/database` in local-socket mode,
    /// `user:password@host:port/database` otherwise.
    pub fn dsn(&self) -> String {
        self.dsn_with_password(&self.password)
    }

    /// [`dsn`](Self::dsn) with the password replaced, for logging.
    pub fn masked_dsn(&self) -> String {
        self.dsn_with_password("***")
    }

    fn dsn_with_password(&self, password: &str) -> String {
        if self.is_local_socket() {
            format!("{}:{}@/{}", self.user, password, self.database)
        } else {
            format!(
                "{}:{}@{}:{}/{}",
                self.user,
                password,
                self.host,
                self.resolved_port(),
                self.database
            )
        }
    }

    pub(super) fn expand_env(&mut self) {
        self.host = expand_env_vars(&self.host);
        self.user = expand_env_vars(&self.user);
        self.password = expand_env_vars(&self.password);
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.is_local_socket() && self.socket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source socket cannot be empty when host is not set".to_string(),
            ));
        }
        if self.pool_size == Some(0) {
            return Err(ConfigError::ValidationError(
                "source pool_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection parameters for the StatsD sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink host (required).
    #[serde(default)]
    pub host: String,

    /// Sink port (0 or absent: 8125).
    #[serde(default)]
    pub port: u16,

    /// Prepended to every metric name.
    #[serde(default)]
    pub prefix: String,
}

impl SinkConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            prefix: String::new(),
        }
    }

    /// Effective port after default substitution.
    pub fn resolved_port(&self) -> u16 {
        port_or_default(self.port, DEFAULT_SINK_PORT)
    }

    /// `host:port` address of the sink.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.resolved_port())
    }

    pub(super) fn expand_env(&mut self) {
        self.host = expand_env_vars(&self.host);
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sink host is required".to_string(),
            ));
        }
        if self.prefix.contains([':', '|', '@']) {
            return Err(ConfigError::ValidationError(format!(
                "sink prefix '{}' contains a reserved character",
                self.prefix
            )));
        }
        Ok(())
    }
}

/// Source and sink parameters, shared read-only for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(host: &str, port: u16) -> SourceConfig {
        SourceConfig {
            host: host.to_string(),
            port,
            user: "monitor".to_string(),
            password: "secret".to_string(),
            database: "app".to_string(),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_dsn_local_socket() {
        assert_eq!(source("", 0).dsn(), "monitor:secret@/app");
        // Port is ignored in local-socket mode.
        assert_eq!(source("", 3307).dsn(), "monitor:secret@/app");
    }

    #[test]
    fn test_dsn_network() {
        assert_eq!(
            source("db01.example.com", 3307).dsn(),
            "monitor:secret@db01.example.com:3307/app"
        );
        assert_eq!(
            source("db01.example.com", 0).dsn(),
            "monitor:secret@db01.example.com:3306/app"
        );
    }

    #[test]
    fn test_masked_dsn_hides_password() {
        let dsn = source("db01", 0).masked_dsn();
        assert_eq!(dsn, "monitor:***@db01:3306/app");
        assert!(!format!("{:?}", source("db01", 0)).contains("secret"));
    }

    #[test]
    fn test_port_defaults() {
        assert_eq!(source("db", 0).resolved_port(), DEFAULT_SOURCE_PORT);
        assert_eq!(source("db", 13306).resolved_port(), 13306);
        assert_eq!(SinkConfig::new("graph", 0).resolved_port(), DEFAULT_SINK_PORT);
        assert_eq!(SinkConfig::new("graph", 9125).resolved_port(), 9125);
    }

    #[test]
    fn test_sink_address() {
        assert_eq!(SinkConfig::new("graph", 0).address(), "graph:8125");
        assert_eq!(SinkConfig::new("10.0.0.5", 9125).address(), "10.0.0.5:9125");
    }

    #[test]
    fn test_endpoint_validation() {
        let mut sink = SinkConfig::new("", 0);
        let err = sink.validate().unwrap_err();
        assert!(err.to_string().contains("sink host is required"));

        sink.host = "graph".to_string();
        assert!(sink.validate().is_ok());

        sink.prefix = "bad:".to_string();
        assert!(sink.validate().is_err());

        let mut source = source("", 0);
        assert!(source.validate().is_ok());
        source.pool_size = Some(0);
        assert!(source.validate().unwrap_err().to_string().contains("pool_size"));
    }

    #[test]
    fn test_endpoint_serde_defaults() {
        let yaml = r#"
source:
  user: monitor
  database: app
sink:
  host: graph
"#;
        let endpoints: EndpointConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(endpoints.source.is_local_socket());
        assert_eq!(endpoints.source.socket, DEFAULT_SOURCE_SOCKET);
        assert_eq!(endpoints.source.resolved_port(), 3306);
        assert_eq!(endpoints.source.pool_size, None);
        assert_eq!(endpoints.sink.address(), "graph:8125");
    }
}
