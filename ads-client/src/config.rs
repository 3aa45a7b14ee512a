//! Session configuration
//!
//! [`AdsConfig`] is the flat, serde-loadable form applications keep in their
//! own configuration files. [`ConnectionBuilder`] is the fluent way to fill it
//! in from code. Both end in a validated [`SessionConfig`].
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use ads_client::ConnectionBuilder;
//!
//! let config = ConnectionBuilder::new()
//!     .host("192.168.0.20")
//!     .target("192.168.0.20.1.1", 801)
//!     .source("192.168.0.5.1.1", 32905)
//!     .verbose(1)
//!     .build()?;
//! # Ok::<(), ads_core::AdsError>(())
//! ```

use ads_ams::DEFAULT_MAX_FRAME_SIZE;
use ads_core::{AdsError, AdsResult, AmsAddress, AmsNetId};
use ads_transport::{TcpSettings, DEFAULT_ADS_TCP_PORT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default AMS port of the first PLC runtime
pub const DEFAULT_TARGET_PORT: u16 = 801;
/// Default AMS port of the client
pub const DEFAULT_SOURCE_PORT: u16 = 32905;
/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

fn default_port() -> u16 {
    DEFAULT_ADS_TCP_PORT
}

fn default_target_port() -> u16 {
    DEFAULT_TARGET_PORT
}

fn default_source_port() -> u16 {
    DEFAULT_SOURCE_PORT
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

/// Connection options as loaded from a configuration source
///
/// `host`, `ams_net_id_target` and `ams_net_id_source` are required; every
/// other field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdsConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub ams_net_id_target: String,
    #[serde(default = "default_target_port")]
    pub ams_port_target: u16,
    #[serde(default)]
    pub ams_net_id_source: String,
    #[serde(default = "default_source_port")]
    pub ams_port_source: u16,
    /// 0: quiet, 1: log frame summaries, 2: also log frame bytes
    #[serde(default)]
    pub verbose: u8,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            ams_net_id_target: String::new(),
            ams_port_target: default_target_port(),
            ams_net_id_source: String::new(),
            ams_port_source: default_source_port(),
            verbose: 0,
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_ms: None,
            max_frame_size: default_max_frame_size(),
        }
    }
}

impl AdsConfig {
    /// Validate the options and produce a session configuration
    ///
    /// # Errors
    ///
    /// - `AdsError::Configuration` if a required option is missing or a
    ///   numeric option is out of range
    /// - `AdsError::InvalidAddress` if a net id is not six dotted numbers
    pub fn validate(&self) -> AdsResult<SessionConfig> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(AdsError::Configuration("host is required".to_string()));
        }
        let target = parse_net_id("ams_net_id_target", &self.ams_net_id_target)?;
        let source = parse_net_id("ams_net_id_source", &self.ams_net_id_source)?;
        if self.port == 0 {
            return Err(AdsError::Configuration("port must not be 0".to_string()));
        }
        if self.max_frame_size == 0 {
            return Err(AdsError::Configuration(
                "max_frame_size must not be 0".to_string(),
            ));
        }

        Ok(SessionConfig {
            host: host.to_string(),
            port: self.port,
            target: AmsAddress::new(target, self.ams_port_target),
            source: AmsAddress::new(source, self.ams_port_source),
            verbose: self.verbose,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            idle_timeout: self.idle_timeout_ms.map(Duration::from_millis),
            max_frame_size: self.max_frame_size,
        })
    }
}

fn parse_net_id(option: &str, value: &str) -> AdsResult<AmsNetId> {
    if value.trim().is_empty() {
        return Err(AdsError::Configuration(format!("{} is required", option)));
    }
    AmsNetId::parse(value.trim())
}

/// Validated configuration of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// AMS address of the PLC runtime
    pub target: AmsAddress,
    /// AMS address this client announces
    pub source: AmsAddress,
    pub verbose: u8,
    pub connect_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_frame_size: usize,
}

impl SessionConfig {
    /// TCP settings for the transport this session runs on
    pub fn tcp_settings(&self) -> TcpSettings {
        let mut settings = TcpSettings::with_timeout(&self.host, self.port, self.connect_timeout);
        settings.idle_timeout = self.idle_timeout;
        settings
    }
}

impl TryFrom<AdsConfig> for SessionConfig {
    type Error = AdsError;

    fn try_from(config: AdsConfig) -> AdsResult<Self> {
        config.validate()
    }
}

/// Fluent builder for [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    config: AdsConfig,
}

impl ConnectionBuilder {
    /// Create a builder with default ports and timeouts
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: AdsConfig) -> Self {
        Self { config }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// TCP port of the ADS router (48898 unless changed)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// AMS net id and port of the PLC runtime
    pub fn target(mut self, net_id: &str, port: u16) -> Self {
        self.config.ams_net_id_target = net_id.to_string();
        self.config.ams_port_target = port;
        self
    }

    /// AMS net id and port of this client
    ///
    /// The net id must match a route configured on the PLC.
    pub fn source(mut self, net_id: &str, port: u16) -> Self {
        self.config.ams_net_id_source = net_id.to_string();
        self.config.ams_port_source = port;
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.config.verbose = level;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// The configuration collected so far
    pub fn config(&self) -> &AdsConfig {
        &self.config
    }

    /// Validate and build the session configuration
    ///
    /// # Errors
    ///
    /// See [`AdsConfig::validate`].
    pub fn build(self) -> AdsResult<SessionConfig> {
        self.config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
            .host("10.0.0.2")
            .target("10.0.0.2.1.1", 851)
            .source("10.0.0.9.1.1", 32905)
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.port, 48898);
        assert_eq!(config.target.port, 851);
        assert_eq!(config.source.net_id, AmsNetId::new(10, 0, 0, 9, 1, 1));
        assert_eq!(config.verbose, 0);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, None);
    }

    #[test]
    fn test_missing_host() {
        let result = ConnectionBuilder::new()
            .target("10.0.0.2.1.1", 851)
            .source("10.0.0.9.1.1", 32905)
            .build();
        assert!(matches!(result, Err(AdsError::Configuration(_))));
    }

    #[test]
    fn test_missing_source() {
        let result = ConnectionBuilder::new()
            .host("10.0.0.2")
            .target("10.0.0.2.1.1", 851)
            .build();
        assert!(matches!(result, Err(AdsError::Configuration(_))));
    }

    #[test]
    fn test_malformed_net_id() {
        let result = builder().target("10.0.0.2.1", 851).build();
        assert!(matches!(result, Err(AdsError::InvalidAddress(_))));

        let result = builder().source("10.0.0.x.1.1", 851).build();
        assert!(matches!(result, Err(AdsError::InvalidAddress(_))));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AdsConfig = serde_json::from_str(
            r#"{
                "host": "plc.local",
                "ams_net_id_target": "5.1.2.3.1.1",
                "ams_net_id_source": "5.1.2.4.1.1",
                "verbose": 2,
                "idle_timeout_ms": 30000
            }"#,
        )
        .unwrap();
        assert_eq!(config.port, 48898);
        assert_eq!(config.ams_port_target, 801);
        assert_eq!(config.ams_port_source, 32905);

        let session = SessionConfig::try_from(config).unwrap();
        assert_eq!(session.verbose, 2);
        assert_eq!(session.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(session.tcp_settings().port, 48898);
    }
}
