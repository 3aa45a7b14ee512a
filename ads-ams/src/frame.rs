//! Complete AMS/TCP frame

use crate::command::CommandId;
use crate::header::{AmsHeader, AmsTcpHeader, AMS_HEADER_LENGTH, AMS_TCP_HEADER_LENGTH};
use ads_core::{AdsError, AdsResult, AmsAddress};
use bytes::{Bytes, BytesMut};

/// One AMS frame: header plus payload
///
/// `header.data_length` always equals `payload.len()`; the constructors keep
/// it that way and [`AmsFrame::decode`] rejects frames where it does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmsFrame {
    header: AmsHeader,
    payload: Bytes,
}

impl AmsFrame {
    /// Create a frame, fixing up the header's payload length
    pub fn new(mut header: AmsHeader, payload: Bytes) -> Self {
        header.data_length = payload.len() as u32;
        Self { header, payload }
    }

    /// Build an ADS request frame
    pub fn request(
        target: AmsAddress,
        source: AmsAddress,
        command: CommandId,
        invoke_id: u32,
        payload: Bytes,
    ) -> Self {
        let header = AmsHeader::request(target, source, command, payload.len() as u32, invoke_id);
        Self { header, payload }
    }

    pub fn header(&self) -> &AmsHeader {
        &self.header
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn command(&self) -> CommandId {
        self.header.command
    }

    pub fn invoke_id(&self) -> u32 {
        self.header.invoke_id
    }

    /// Total size on the wire
    pub fn wire_length(&self) -> usize {
        AMS_TCP_HEADER_LENGTH + AMS_HEADER_LENGTH + self.payload.len()
    }

    /// ADS return code of the frame
    ///
    /// The AMS header error code wins when set. Otherwise responses carry
    /// their result in the first four payload bytes; notifications have none.
    pub fn result_code(&self) -> u32 {
        if self.header.error_code != 0 {
            return self.header.error_code;
        }
        if self.header.command.is_notification() || self.payload.len() < 4 {
            return 0;
        }
        u32::from_le_bytes([
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
        ])
    }

    /// Serialize the frame to wire bytes
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.wire_length());
        AmsTcpHeader::new((AMS_HEADER_LENGTH + self.payload.len()) as u32).encode(&mut out);
        self.header.encode(&mut out);
        out.extend_from_slice(&self.payload);
        out.freeze()
    }

    /// Parse exactly one complete frame
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MalformedFrame` if the buffer length, the AMS/TCP
    /// length and the AMS payload length disagree.
    pub fn decode(data: &[u8]) -> AdsResult<Self> {
        let tcp_header = AmsTcpHeader::decode(data)?;
        let expected = AMS_TCP_HEADER_LENGTH + tcp_header.length as usize;
        if data.len() != expected {
            return Err(AdsError::MalformedFrame(format!(
                "Frame announces {} bytes, buffer holds {}",
                expected,
                data.len()
            )));
        }
        if (tcp_header.length as usize) < AMS_HEADER_LENGTH {
            return Err(AdsError::MalformedFrame(format!(
                "AMS/TCP length {} is shorter than the AMS header",
                tcp_header.length
            )));
        }

        let body = &data[AMS_TCP_HEADER_LENGTH..];
        let header = AmsHeader::decode(body)?;
        let payload = &body[AMS_HEADER_LENGTH..];
        if header.data_length as usize != payload.len() {
            return Err(AdsError::MalformedFrame(format!(
                "AMS payload length {} disagrees with frame length {}",
                header.data_length,
                payload.len()
            )));
        }

        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}
