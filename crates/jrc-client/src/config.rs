//! Configuration types for the batching client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Default number of concurrent connections per dispatch cycle
pub const DEFAULT_MAX_CONNECTIONS: usize = 4;

/// Default number of requests packed into one HTTP exchange
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint URL; the scheme decides whether TLS is used
    pub endpoint: String,

    /// Upper bound on concurrent exchanges within one dispatch cycle
    pub max_connections: usize,

    /// Upper bound on requests per batch
    pub max_batch_size: usize,

    /// Timeout configurations
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Connection configurations
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection establishment timeout
    #[serde(with = "duration_serde")]
    pub connect: Duration,

    /// Timeout for one batch exchange, from send to the last body byte
    #[serde(with = "duration_serde")]
    pub request: Duration,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// User agent string
    pub user_agent: Option<String>,

    /// Maximum number of idle keep-alive connections held per host
    pub max_idle_per_host: usize,

    /// How long an idle connection is kept before it is closed
    #[serde(with = "duration_serde")]
    pub idle_timeout: Duration,

    /// Advertise and transparently decode gzip response bodies
    pub gzip: bool,
}

impl ClientConfig {
    /// Configuration for `endpoint` with default limits
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Check every option and return the parsed endpoint
    pub fn validate(&self) -> Result<Url, ConfigError> {
        require_positive("max_connections", self.max_connections)?;
        require_positive("max_batch_size", self.max_batch_size)?;
        parse_endpoint(&self.endpoint)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            timeouts: TimeoutConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(60),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("jrc-client/{}", env!("CARGO_PKG_VERSION"))),
            max_idle_per_host: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: Duration::from_secs(90),
            gzip: true,
        }
    }
}

/// Parse an endpoint URL, accepting only `http` and `https`
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            url: endpoint.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Reject zero for count-valued options
pub fn require_positive(option: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::NonPositive { option })
    } else {
        Ok(value)
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.max_batch_size, 50);
        assert!(config.connection.gzip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = ClientConfig::new("http://localhost:8545");
        config.max_connections = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { option: "max_connections" })
        ));

        config.max_connections = 2;
        config.max_batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { option: "max_batch_size" })
        ));
    }

    #[test]
    fn test_parse_endpoint() {
        let url = parse_endpoint("https://rpc.example.org:8443/v1/key").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.port(), Some(8443));

        assert!(matches!(
            parse_endpoint("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_endpoint("ws://localhost:8546"),
            Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ws"
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig::new("http://node:8545");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeouts"]["request"], 60_000);

        let parsed: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.endpoint, "http://node:8545");
        assert_eq!(parsed.timeouts.connect, Duration::from_secs(10));
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let parsed: ClientConfig = serde_json::from_str(
            r#"{"endpoint":"http://node:8545","max_connections":8,"max_batch_size":100}"#,
        )
        .unwrap();
        assert_eq!(parsed.max_connections, 8);
        assert_eq!(parsed.connection.max_idle_per_host, DEFAULT_MAX_CONNECTIONS);
    }
}
