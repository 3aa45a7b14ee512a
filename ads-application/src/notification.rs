//! Device notification payloads
//!
//! ```text
//! length u32 | stamp count u32 | stamp*
//! stamp  := FILETIME u64 | sample count u32 | sample*
//! sample := notification handle u32 | size u32 | data[size]
//! ```

use crate::pdu::PayloadReader;
use ads_core::{AdsError, AdsResult};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// FILETIME ticks (100 ns) per second
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;
/// Seconds between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_OFFSET_SECONDS: i64 = 11_644_473_600;

/// Convert a Windows FILETIME to UTC
pub fn filetime_to_utc(filetime: u64) -> DateTime<Utc> {
    let seconds = (filetime / FILETIME_TICKS_PER_SECOND) as i64 - FILETIME_UNIX_OFFSET_SECONDS;
    let nanos = ((filetime % FILETIME_TICKS_PER_SECOND) * 100) as u32;
    DateTime::<Utc>::from_timestamp(seconds, nanos).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// One sample: the raw value bytes of one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSample {
    pub notification_handle: u32,
    pub data: Bytes,
}

/// Samples sharing one device timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationStamp {
    pub filetime: u64,
    pub samples: Vec<NotificationSample>,
}

impl NotificationStamp {
    pub fn timestamp(&self) -> DateTime<Utc> {
        filetime_to_utc(self.filetime)
    }
}

/// Decoded payload of a Notification frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationStream {
    pub stamps: Vec<NotificationStamp>,
}

impl NotificationStream {
    /// Parse a Notification payload
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MalformedFrame` if a declared count or size runs
    /// past the end of the payload.
    pub fn decode(payload: &Bytes) -> AdsResult<Self> {
        let mut reader = PayloadReader::new(payload, "notification");
        let length = reader.u32()? as usize;
        if length > reader.remaining() {
            return Err(AdsError::MalformedFrame(format!(
                "Notification announces {} bytes, {} present",
                length,
                reader.remaining()
            )));
        }

        let stamp_count = reader.u32()?;
        let mut stamps = Vec::new();
        for _ in 0..stamp_count {
            let filetime = reader.u64()?;
            let sample_count = reader.u32()?;
            let mut samples = Vec::new();
            for _ in 0..sample_count {
                let notification_handle = reader.u32()?;
                let size = reader.u32()? as usize;
                let data = reader.bytes(size)?;
                samples.push(NotificationSample {
                    notification_handle,
                    data: payload.slice_ref(data),
                });
            }
            stamps.push(NotificationStamp { filetime, samples });
        }

        Ok(Self { stamps })
    }

    /// Total number of samples across all stamps
    pub fn sample_count(&self) -> usize {
        self.stamps.iter().map(|s| s.samples.len()).sum()
    }
}
