//! Transport layer module for the ADS protocol
//!
//! ADS runs over a plain TCP byte stream (port 48898 by default). This crate
//! opens that stream and splits it into an owned read half, driven by the
//! session's inbound task, and an owned write half shared by the commands.

pub mod stream;
pub mod tcp;

pub use ads_core::{AdsError, AdsResult};
pub use stream::{split_stream, TransportLayer, TransportReader, TransportWriter};
pub use tcp::{TcpSettings, TcpTransport, DEFAULT_ADS_TCP_PORT};
