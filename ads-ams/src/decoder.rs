//! AMS/TCP stream reassembly
//!
//! TCP delivers bytes, not frames: one read may hold half a frame or several
//! frames back to back. The decoder buffers inbound chunks and cuts complete
//! frames off the front using the AMS/TCP length prefix.

use crate::frame::AmsFrame;
use crate::header::{AmsTcpHeader, AMS_HEADER_LENGTH, AMS_TCP_HEADER_LENGTH};
use ads_core::{AdsError, AdsResult};
use bytes::BytesMut;

/// Largest frame accepted by default (AMS/TCP length field)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Length-prefixed AMS frame decoder
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            max_frame_size,
        }
    }

    /// Append an inbound chunk
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Cut the next complete frame off the buffer
    ///
    /// Returns `Ok(None)` while the announced length has not fully arrived.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MalformedFrame` if the prefix is invalid. The stream
    /// cannot be resynchronized after that; the caller must drop it.
    pub fn next_frame(&mut self) -> AdsResult<Option<AmsFrame>> {
        if self.buffer.len() < AMS_TCP_HEADER_LENGTH {
            return Ok(None);
        }

        let tcp_header = AmsTcpHeader::decode(&self.buffer[..AMS_TCP_HEADER_LENGTH])?;
        let length = tcp_header.length as usize;
        if length < AMS_HEADER_LENGTH {
            return Err(AdsError::MalformedFrame(format!(
                "AMS/TCP length {} is shorter than the AMS header",
                length
            )));
        }
        if length > self.max_frame_size {
            return Err(AdsError::MalformedFrame(format!(
                "AMS/TCP length {} exceeds maximum frame size {}",
                length, self.max_frame_size
            )));
        }

        let total = AMS_TCP_HEADER_LENGTH + length;
        if self.buffer.len() < total {
            self.buffer.reserve(total - self.buffer.len());
            return Ok(None);
        }

        let raw = self.buffer.split_to(total);
        AmsFrame::decode(&raw).map(Some)
    }

    /// Bytes waiting for the rest of their frame
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandId;
    use ads_core::{AmsAddress, AmsNetId};
    use bytes::Bytes;

    fn frame(invoke_id: u32, payload: &'static [u8]) -> AmsFrame {
        AmsFrame::request(
            AmsAddress::new(AmsNetId::new(1, 2, 3, 4, 1, 1), 801),
            AmsAddress::new(AmsNetId::new(1, 2, 3, 5, 1, 1), 32905),
            CommandId::Read,
            invoke_id,
            Bytes::from_static(payload),
        )
    }

    #[test]
    fn test_incomplete_header() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0, 0, 40]);
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered_len(), 3);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let wire = frame(1, &[1, 2, 3, 4]).encode();
        let mut decoder = FrameDecoder::new();

        decoder.extend(&wire[..20]);
        assert!(decoder.next_frame().unwrap().is_none());

        decoder.extend(&wire[20..]);
        let decoded = decoder.next_frame().unwrap().unwrap();
        assert_eq!(decoded.invoke_id(), 1);
        assert_eq!(&decoded.payload()[..], &[1, 2, 3, 4]);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut chunk = frame(1, &[0xAA]).encode().to_vec();
        chunk.extend_from_slice(&frame(2, &[]).encode());
        chunk.extend_from_slice(&frame(3, &[0xBB, 0xCC]).encode()[..10]);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&chunk);
        assert_eq!(decoder.next_frame().unwrap().unwrap().invoke_id(), 1);
        assert_eq!(decoder.next_frame().unwrap().unwrap().invoke_id(), 2);
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered_len(), 10);
    }

    #[test]
    fn test_length_shorter_than_header() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0, 0, 4, 0, 0, 0, 1, 2, 3, 4]);
        assert!(matches!(
            decoder.next_frame(),
            Err(AdsError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_oversized_frame() {
        let mut decoder = FrameDecoder::with_max_frame_size(64);
        decoder.extend(&[0, 0, 0, 1, 0, 0]);
        assert!(matches!(
            decoder.next_frame(),
            Err(AdsError::MalformedFrame(_))
        ));
    }
}
