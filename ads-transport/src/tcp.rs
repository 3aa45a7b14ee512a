//! TCP transport implementation

use crate::stream::{TransportLayer, TransportReader, TransportWriter};
use ads_core::{AdsError, AdsResult};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// Default TCP port of the ADS router
pub const DEFAULT_ADS_TCP_PORT: u16 = 48898;

/// Wrapper for TcpStream that implements Debug
struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream").finish()
    }
}

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub host: String,
    pub port: u16,
    /// Bound on connection establishment
    pub connect_timeout: Option<Duration>,
    /// Bound on silence while reading; `None` waits forever
    pub idle_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Some(Duration::from_secs(5)),
            idle_timeout: None,
        }
    }

    /// Create TCP settings with a connect timeout
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
            ..Self::new(host, port)
        }
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> AdsResult<()> {
        if !self.closed {
            return Err(AdsError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let address = (self.settings.host.as_str(), self.settings.port);
        let stream = if let Some(timeout) = self.settings.connect_timeout {
            tokio::time::timeout(timeout, TcpStream::connect(address))
                .await
                .map_err(|_| AdsError::Timeout)??
        } else {
            TcpStream::connect(address).await?
        };
        stream.set_nodelay(true)?;

        log::debug!(
            "Connected to ADS router at {}:{}",
            self.settings.host,
            self.settings.port
        );
        self.stream = Some(DebugTcpStream(stream));
        self.closed = false;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn into_split(self) -> AdsResult<(TransportReader, TransportWriter)> {
        let stream = self.stream.ok_or_else(|| {
            AdsError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream not connected",
            ))
        })?;

        let (reader, writer) = stream.0.into_split();
        Ok((
            TransportReader::new(reader, self.settings.idle_timeout),
            TransportWriter::new(writer),
        ))
    }
}
