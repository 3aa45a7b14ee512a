//! AMS layer module for the ADS protocol
//!
//! Every ADS message travels in one frame:
//!
//! ```text
//! +----------------------+-------------------------------+-----------+
//! | AMS/TCP header (6 B) | AMS header (32 B)             | payload   |
//! | reserved | length    | target | source | cmd | ...   |           |
//! +----------------------+-------------------------------+-----------+
//! ```
//!
//! This crate encodes and decodes those frames and reassembles them from an
//! arbitrarily chunked TCP byte stream.

pub mod command;
pub mod decoder;
pub mod frame;
pub mod header;
pub mod statistics;

pub use ads_core::{AdsError, AdsResult};
pub use command::{CommandId, StateFlags};
pub use decoder::{FrameDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use frame::AmsFrame;
pub use header::{AmsHeader, AmsTcpHeader, AMS_HEADER_LENGTH, AMS_TCP_HEADER_LENGTH};
pub use statistics::FrameStatistics;
