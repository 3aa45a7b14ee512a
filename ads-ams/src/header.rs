//! AMS/TCP and AMS header encoding/decoding (little-endian)

use crate::command::{CommandId, StateFlags};
use ads_core::{AdsError, AdsResult, AmsAddress, AmsNetId};
use bytes::{Buf, BufMut, BytesMut};

/// AMS/TCP header length: 2 reserved bytes + 4 length bytes
pub const AMS_TCP_HEADER_LENGTH: usize = 6;

/// AMS header length
pub const AMS_HEADER_LENGTH: usize = 32;

/// AMS/TCP header
///
/// `length` counts the AMS header plus payload, not the AMS/TCP header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmsTcpHeader {
    pub length: u32,
}

impl AmsTcpHeader {
    pub fn new(length: u32) -> Self {
        Self { length }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        out.put_u16_le(0);
        out.put_u32_le(self.length);
    }

    /// Decode the header from the first six bytes of `data`
    pub fn decode(data: &[u8]) -> AdsResult<Self> {
        if data.len() < AMS_TCP_HEADER_LENGTH {
            return Err(AdsError::MalformedFrame(format!(
                "AMS/TCP header too short: expected {}, got {}",
                AMS_TCP_HEADER_LENGTH,
                data.len()
            )));
        }

        let mut buf = &data[..AMS_TCP_HEADER_LENGTH];
        let reserved = buf.get_u16_le();
        if reserved != 0 {
            return Err(AdsError::MalformedFrame(format!(
                "AMS/TCP reserved field must be 0, got 0x{:04X}",
                reserved
            )));
        }
        Ok(Self {
            length: buf.get_u32_le(),
        })
    }
}

/// AMS header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmsHeader {
    pub target: AmsAddress,
    pub source: AmsAddress,
    pub command: CommandId,
    pub state_flags: StateFlags,
    /// Payload length following the header
    pub data_length: u32,
    pub error_code: u32,
    pub invoke_id: u32,
}

impl AmsHeader {
    /// Header of an outgoing ADS request
    pub fn request(
        target: AmsAddress,
        source: AmsAddress,
        command: CommandId,
        data_length: u32,
        invoke_id: u32,
    ) -> Self {
        Self {
            target,
            source,
            command,
            state_flags: StateFlags::request(),
            data_length,
            error_code: 0,
            invoke_id,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        out.put_slice(self.target.net_id.as_bytes());
        out.put_u16_le(self.target.port);
        out.put_slice(self.source.net_id.as_bytes());
        out.put_u16_le(self.source.port);
        out.put_u16_le(self.command.as_u16());
        out.put_u16_le(self.state_flags.bits());
        out.put_u32_le(self.data_length);
        out.put_u32_le(self.error_code);
        out.put_u32_le(self.invoke_id);
    }

    /// Decode the header from the first 32 bytes of `data`
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MalformedFrame` if `data` is too short or the
    /// command id is unknown.
    pub fn decode(data: &[u8]) -> AdsResult<Self> {
        if data.len() < AMS_HEADER_LENGTH {
            return Err(AdsError::MalformedFrame(format!(
                "AMS header too short: expected {}, got {}",
                AMS_HEADER_LENGTH,
                data.len()
            )));
        }

        let mut buf = &data[..AMS_HEADER_LENGTH];
        let target = read_address(&mut buf);
        let source = read_address(&mut buf);
        let command = CommandId::from_u16(buf.get_u16_le())?;
        let state_flags = StateFlags::from_bits(buf.get_u16_le());
        let data_length = buf.get_u32_le();
        let error_code = buf.get_u32_le();
        let invoke_id = buf.get_u32_le();

        Ok(Self {
            target,
            source,
            command,
            state_flags,
            data_length,
            error_code,
            invoke_id,
        })
    }
}

fn read_address(buf: &mut &[u8]) -> AmsAddress {
    let mut net_id = [0u8; AmsNetId::LENGTH];
    buf.copy_to_slice(&mut net_id);
    let port = buf.get_u16_le();
    AmsAddress::new(AmsNetId::from_bytes(net_id), port)
}
