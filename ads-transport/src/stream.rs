//! Stream halves and the transport layer trait

use ads_core::{AdsError, AdsResult};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Transport layer that can be opened and then split into owned halves
#[async_trait]
pub trait TransportLayer: Send {
    /// Open the physical layer connection
    async fn open(&mut self) -> AdsResult<()>;

    /// Check if the transport is closed
    fn is_closed(&self) -> bool;

    /// Split an open transport into its read and write halves
    ///
    /// # Errors
    ///
    /// Returns `AdsError::Connection` (`NotConnected`) if the transport was
    /// never opened.
    fn into_split(self) -> AdsResult<(TransportReader, TransportWriter)>
    where
        Self: Sized;
}

/// Read half of a transport
///
/// A read returning `Ok(0)` means the peer closed the stream. When an idle
/// timeout is configured and no byte arrives within it, the read fails with
/// `AdsError::Timeout`.
pub struct TransportReader {
    inner: Box<dyn AsyncRead + Send + Unpin>,
    idle_timeout: Option<Duration>,
    closed: bool,
}

impl fmt::Debug for TransportReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportReader")
            .field("idle_timeout", &self.idle_timeout)
            .field("closed", &self.closed)
            .finish()
    }
}

impl TransportReader {
    pub fn new<R>(reader: R, idle_timeout: Option<Duration>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            inner: Box::new(reader),
            idle_timeout,
            closed: false,
        }
    }

    /// Read whatever is available into `buf`
    pub async fn read(&mut self, buf: &mut [u8]) -> AdsResult<usize> {
        if self.closed {
            return Ok(0);
        }

        let result = match self.idle_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.inner.read(buf))
                .await
                .map_err(|_| AdsError::Timeout)?
                .map_err(AdsError::Connection),
            None => self.inner.read(buf).await.map_err(AdsError::Connection),
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Write half of a transport
pub struct TransportWriter {
    inner: Box<dyn AsyncWrite + Send + Unpin>,
    closed: bool,
}

impl fmt::Debug for TransportWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportWriter")
            .field("closed", &self.closed)
            .finish()
    }
}

impl TransportWriter {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Box::new(writer),
            closed: false,
        }
    }

    /// Write a complete frame and flush it
    pub async fn write_all(&mut self, buf: &[u8]) -> AdsResult<()> {
        if self.closed {
            return Err(AdsError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Transport is closed",
            )));
        }

        let result = async {
            self.inner.write_all(buf).await?;
            self.inner.flush().await
        }
        .await;

        if let Err(e) = result {
            self.closed = true;
            return Err(AdsError::Connection(e));
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut the write direction down; idempotent
    pub async fn close(&mut self) -> AdsResult<()> {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.inner.shutdown().await {
                log::debug!("Ignoring error while shutting down transport: {}", e);
            }
        }
        Ok(())
    }
}

/// Split any bidirectional byte stream into transport halves
pub fn split_stream<S>(stream: S, idle_timeout: Option<Duration>) -> (TransportReader, TransportWriter)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    (
        TransportReader::new(reader, idle_timeout),
        TransportWriter::new(writer),
    )
}
