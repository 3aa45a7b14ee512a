//! ADS client
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use ads_client::{AdsClient, AdsConfig, SessionEvent};
//! use ads_application::Handle;
//! use ads_core::PlcType;
//!
//! # async fn run() -> ads_core::AdsResult<()> {
//! let config = AdsConfig {
//!     host: "192.168.0.20".to_string(),
//!     ams_net_id_target: "192.168.0.20.1.1".to_string(),
//!     ams_net_id_source: "192.168.0.5.1.1".to_string(),
//!     ..AdsConfig::default()
//! };
//! let (client, mut events) = AdsClient::connect(config).await?;
//!
//! let mut counter = Handle::scalar("MAIN.counter", PlcType::Dint);
//! client.read(&mut counter).await?;
//! println!("counter = {:?}", counter.get("value"));
//!
//! client.notify(&mut counter).await?;
//! if let Some(SessionEvent::Notification(n)) = events.recv().await {
//!     println!("{} changed: {:?}", n.handle.symbol(), n.handle.get("value"));
//! }
//!
//! client.end().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{AdsConfig, SessionConfig};
use crate::event::SessionEvent;
use crate::requester::{check_result, AdsRequester};
use crate::session::Session;
use ads_ams::{CommandId, FrameStatistics};
use ads_application::index_group::RW_SYMVAL_BYHANDLE;
use ads_application::marshal;
use ads_application::pdu::{
    DataResponse, ReadRequest, ReadStateResponse, ReadWriteRequest, WriteControlRequest,
    WriteRequest,
};
use ads_application::{AdsState, DeviceInfo, DeviceState, Handle};
use ads_core::AdsResult;
use ads_transport::{TcpTransport, TransportLayer, TransportReader, TransportWriter};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Connected ADS client
///
/// All commands take `&self` and may run concurrently; responses are paired
/// with their requests by invoke id, never by arrival order. A command whose
/// response never arrives never completes; wrap it in
/// `tokio::time::timeout` to bound it.
#[derive(Debug)]
pub struct AdsClient {
    session: Arc<Session>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl AdsClient {
    /// Connect over TCP
    ///
    /// Returns the client and the receiver of its session events.
    ///
    /// # Errors
    ///
    /// - `AdsError::Configuration` / `AdsError::InvalidAddress` for a bad config
    /// - `AdsError::Connection` / `AdsError::Timeout` if the PLC cannot be reached
    pub async fn connect(
        config: AdsConfig,
    ) -> AdsResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let config = config.validate()?;
        let mut transport = TcpTransport::new(config.tcp_settings());
        transport.open().await?;
        let (reader, writer) = transport.into_split()?;
        Ok(Self::with_transport(config, reader, writer))
    }

    /// Run a client over an already open transport
    pub fn with_transport(
        config: SessionConfig,
        reader: TransportReader,
        writer: TransportWriter,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (session, events, task) = Session::start(config, reader, writer);
        (
            Self {
                session,
                reader_task: Mutex::new(Some(task)),
            },
            events,
        )
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    pub async fn statistics(&self) -> FrameStatistics {
        self.session.statistics().await
    }

    /// Read name and version of the device
    pub async fn read_device_info(&self) -> AdsResult<DeviceInfo> {
        let frame = self
            .session
            .request(CommandId::ReadDeviceInfo, Bytes::new())
            .await?;
        check_result(frame.result_code())?;
        DeviceInfo::decode(frame.payload())
    }

    /// Read ADS state and device state
    pub async fn read_state(&self) -> AdsResult<DeviceState> {
        let frame = self.session.request(CommandId::ReadState, Bytes::new()).await?;
        check_result(frame.result_code())?;
        Ok(ReadStateResponse::decode(frame.payload())?.state)
    }

    /// Request an ADS state change, e.g. `Run` or `Stop`
    pub async fn write_control(
        &self,
        ads_state: AdsState,
        device_state: u16,
        data: Bytes,
    ) -> AdsResult<()> {
        let request = WriteControlRequest {
            ads_state,
            device_state,
            data,
        };
        let frame = self
            .session
            .request(CommandId::WriteControl, request.encode())
            .await?;
        check_result(frame.result_code())
    }

    /// Resolve the handle's symbol, once per session
    ///
    /// A device handle cached from an earlier session is not trusted; the
    /// symbol is looked up again.
    pub async fn resolve(&self, handle: &mut Handle) -> AdsResult<u32> {
        self.session
            .symbols()
            .resolve(self.session.as_ref(), handle)
            .await
    }

    /// Read the handle's symbol and decode it into the handle's fields
    pub async fn read(&self, handle: &mut Handle) -> AdsResult<()> {
        let length = handle.request_length()?;
        let device_handle = self.resolve(handle).await?;
        let data = self
            .read_raw(RW_SYMVAL_BYHANDLE, device_handle, length)
            .await?;
        marshal::decode(handle, &data)
    }

    /// Encode the handle's fields and write them to its symbol
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MissingFieldValue` before anything is sent if a
    /// field holds no value.
    pub async fn write(&self, handle: &mut Handle) -> AdsResult<()> {
        let data = marshal::encode(handle)?;
        let device_handle = self.resolve(handle).await?;
        self.write_raw(RW_SYMVAL_BYHANDLE, device_handle, data).await
    }

    /// Subscribe to the handle's symbol; returns the notification handle
    ///
    /// The subscription keeps its own copy of `handle`. Pushed samples are
    /// decoded into that copy and arrive as [`SessionEvent::Notification`],
    /// whose `handle` holds the new values; the caller's `handle` is not
    /// updated.
    pub async fn notify(&self, handle: &mut Handle) -> AdsResult<u32> {
        self.session
            .notifications()
            .subscribe(self.session.as_ref(), self.session.symbols(), handle)
            .await
    }

    /// Delete one subscription
    pub async fn unsubscribe(&self, notification_handle: u32) -> AdsResult<()> {
        self.session
            .notifications()
            .unsubscribe(self.session.as_ref(), notification_handle)
            .await
    }

    /// Read `length` bytes at an index group/offset
    pub async fn read_raw(
        &self,
        index_group: u32,
        index_offset: u32,
        length: u32,
    ) -> AdsResult<Bytes> {
        let request = ReadRequest::new(index_group, index_offset, length);
        let frame = self.session.request(CommandId::Read, request.encode()).await?;
        check_result(frame.result_code())?;
        Ok(DataResponse::decode(frame.payload())?.data)
    }

    /// Write bytes at an index group/offset
    pub async fn write_raw(&self, index_group: u32, index_offset: u32, data: Bytes) -> AdsResult<()> {
        let request = WriteRequest::new(index_group, index_offset, data);
        let frame = self.session.request(CommandId::Write, request.encode()).await?;
        check_result(frame.result_code())
    }

    /// Write bytes and read the answer in one round trip
    pub async fn read_write_raw(
        &self,
        index_group: u32,
        index_offset: u32,
        read_length: u32,
        data: Bytes,
    ) -> AdsResult<Bytes> {
        let request = ReadWriteRequest::new(index_group, index_offset, read_length, data);
        let frame = self
            .session
            .request(CommandId::ReadWrite, request.encode())
            .await?;
        check_result(frame.result_code())?;
        Ok(DataResponse::decode(frame.payload())?.data)
    }

    /// Tear the session down
    ///
    /// Releases all symbol handles, then deletes all notifications, then
    /// closes the transport, each stage finishing before the next starts.
    /// The transport is closed even if a release stage failed; the first
    /// error is returned.
    pub async fn end(&self) -> AdsResult<()> {
        let mut first_error = None;

        if !self.session.is_closed() {
            let session = self.session.as_ref();
            match session.symbols().release_all(session).await {
                Ok(count) => log::debug!("Teardown released {} symbol handles", count),
                Err(e) => first_error = Some(e),
            }
            match session.notifications().unsubscribe_all(session).await {
                Ok(count) => log::debug!("Teardown deleted {} notifications", count),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Err(e) = self.session.close().await {
            first_error.get_or_insert(e);
        }
        if let Some(task) = self.reader_task.lock().await.take() {
            if let Err(e) = task.await {
                log::warn!("ADS reader task ended abnormally: {}", e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
