//! ADS command payloads
//!
//! Request payloads follow the AMS header of a request frame; response
//! payloads always begin with the 4-byte ADS result. All fields are
//! little-endian.

use crate::handle::TransmissionMode;
use crate::state::{AdsState, DeviceState};
use ads_core::{AdsError, AdsResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Length of the device name field in a ReadDeviceInfo response
pub const DEVICE_NAME_LENGTH: usize = 16;

/// Bounds-checked little-endian reader over a response payload
pub(crate) struct PayloadReader<'a> {
    buf: &'a [u8],
    what: &'static str,
}

impl<'a> PayloadReader<'a> {
    pub(crate) fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, what }
    }

    fn ensure(&self, n: usize) -> AdsResult<()> {
        if self.buf.len() < n {
            return Err(AdsError::MalformedFrame(format!(
                "{} truncated: need {} more bytes, have {}",
                self.what,
                n,
                self.buf.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> AdsResult<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u16(&mut self) -> AdsResult<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub(crate) fn u32(&mut self) -> AdsResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn u64(&mut self) -> AdsResult<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub(crate) fn bytes(&mut self, n: usize) -> AdsResult<&'a [u8]> {
        self.ensure(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len()
    }
}

/// Read request: index group, index offset, length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub index_group: u32,
    pub index_offset: u32,
    pub length: u32,
}

impl ReadRequest {
    pub fn new(index_group: u32, index_offset: u32, length: u32) -> Self {
        Self {
            index_group,
            index_offset,
            length,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(12);
        out.put_u32_le(self.index_group);
        out.put_u32_le(self.index_offset);
        out.put_u32_le(self.length);
        out.freeze()
    }
}

/// Write request: index group, index offset, length, data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub index_group: u32,
    pub index_offset: u32,
    pub data: Bytes,
}

impl WriteRequest {
    pub fn new(index_group: u32, index_offset: u32, data: Bytes) -> Self {
        Self {
            index_group,
            index_offset,
            data,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(12 + self.data.len());
        out.put_u32_le(self.index_group);
        out.put_u32_le(self.index_offset);
        out.put_u32_le(self.data.len() as u32);
        out.put_slice(&self.data);
        out.freeze()
    }
}

/// ReadWrite request: index group, index offset, read length, write length, data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteRequest {
    pub index_group: u32,
    pub index_offset: u32,
    pub read_length: u32,
    pub data: Bytes,
}

impl ReadWriteRequest {
    pub fn new(index_group: u32, index_offset: u32, read_length: u32, data: Bytes) -> Self {
        Self {
            index_group,
            index_offset,
            read_length,
            data,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(16 + self.data.len());
        out.put_u32_le(self.index_group);
        out.put_u32_le(self.index_offset);
        out.put_u32_le(self.read_length);
        out.put_u32_le(self.data.len() as u32);
        out.put_slice(&self.data);
        out.freeze()
    }
}

/// AddNotification request
///
/// Max delay and cycle time are in 100 ns ticks on the wire, followed by
/// 16 reserved zero bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNotificationRequest {
    pub index_group: u32,
    pub index_offset: u32,
    pub length: u32,
    pub mode: TransmissionMode,
    pub max_delay_ticks: u32,
    pub cycle_time_ticks: u32,
}

impl AddNotificationRequest {
    pub const ENCODED_LENGTH: usize = 40;

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(Self::ENCODED_LENGTH);
        out.put_u32_le(self.index_group);
        out.put_u32_le(self.index_offset);
        out.put_u32_le(self.length);
        out.put_u32_le(self.mode.as_u32());
        out.put_u32_le(self.max_delay_ticks);
        out.put_u32_le(self.cycle_time_ticks);
        out.put_bytes(0, 16);
        out.freeze()
    }
}

/// DeleteNotification request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteNotificationRequest {
    pub notification_handle: u32,
}

impl DeleteNotificationRequest {
    pub fn new(notification_handle: u32) -> Self {
        Self { notification_handle }
    }

    pub fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(&self.notification_handle.to_le_bytes())
    }
}

/// WriteControl request: ADS state, device state, length, data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteControlRequest {
    pub ads_state: AdsState,
    pub device_state: u16,
    pub data: Bytes,
}

impl WriteControlRequest {
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(8 + self.data.len());
        out.put_u16_le(self.ads_state.as_u16());
        out.put_u16_le(self.device_state);
        out.put_u32_le(self.data.len() as u32);
        out.put_slice(&self.data);
        out.freeze()
    }
}

/// Device identification returned by ReadDeviceInfo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub major_version: u8,
    pub minor_version: u8,
    pub version_build: u16,
    pub device_name: String,
}

impl DeviceInfo {
    /// Decode a ReadDeviceInfo response payload (after a zero result)
    pub fn decode(payload: &[u8]) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "ReadDeviceInfo response");
        let _result = reader.u32()?;
        let major_version = reader.u8()?;
        let minor_version = reader.u8()?;
        let version_build = reader.u16()?;
        let name = reader.bytes(DEVICE_NAME_LENGTH)?;
        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());

        Ok(Self {
            major_version,
            minor_version,
            version_build,
            device_name: String::from_utf8_lossy(&name[..end]).into_owned(),
        })
    }
}

/// Response carrying only the ADS result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultResponse {
    pub result: u32,
}

impl ResultResponse {
    pub fn decode(payload: &[u8]) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "ADS response");
        Ok(Self {
            result: reader.u32()?,
        })
    }
}

/// Read and ReadWrite response: result, length, data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataResponse {
    pub result: u32,
    pub data: Bytes,
}

impl DataResponse {
    /// Decode a Read or ReadWrite response payload
    ///
    /// A failed request may omit the length and data fields entirely.
    pub fn decode(payload: &Bytes) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "data response");
        let result = reader.u32()?;
        if result != 0 && reader.remaining() == 0 {
            return Ok(Self {
                result,
                data: Bytes::new(),
            });
        }

        let length = reader.u32()? as usize;
        let start = payload.len() - reader.remaining();
        reader.bytes(length)?;
        Ok(Self {
            result,
            data: payload.slice(start..start + length),
        })
    }
}

/// ReadState response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStateResponse {
    pub result: u32,
    pub state: DeviceState,
}

impl ReadStateResponse {
    pub fn decode(payload: &[u8]) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "ReadState response");
        let result = reader.u32()?;
        let ads_state = AdsState::from_u16(reader.u16()?);
        let device_state = reader.u16()?;
        Ok(Self {
            result,
            state: DeviceState {
                ads_state,
                device_state,
            },
        })
    }
}

/// AddNotification response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNotificationResponse {
    pub result: u32,
    pub notification_handle: u32,
}

impl AddNotificationResponse {
    /// A successful response must carry the notification handle; an error
    /// response may stop after the result.
    pub fn decode(payload: &[u8]) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "AddNotification response");
        let result = reader.u32()?;
        let notification_handle = if result == 0 || reader.remaining() >= 4 {
            reader.u32()?
        } else {
            0
        };
        Ok(Self {
            result,
            notification_handle,
        })
    }
}
