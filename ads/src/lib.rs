//! ads - Rust implementation of the ADS/AMS client protocol
//!
//! ADS is the request/response and notification protocol spoken by PLC
//! runtimes on top of AMS messaging over TCP.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ads-core`: error taxonomy, AMS addressing, ADS error codes, PLC types
//! - `ads-transport`: byte-stream transport (TCP, any tokio stream)
//! - `ads-ams`: AMS/TCP framing and stream reassembly
//! - `ads-application`: command payloads, handles, value marshalling
//! - `ads-client`: session, correlation, symbol handles, notifications
//!
//! # Usage
//!
//! ```no_run
//! use ads::client::{AdsClient, ConnectionBuilder};
//! use ads::{Handle, PlcType};
//!
//! # async fn run() -> ads::AdsResult<()> {
//! let config = ConnectionBuilder::new()
//!     .host("192.168.0.20")
//!     .target("192.168.0.20.1.1", 851)
//!     .source("192.168.0.5.1.1", 32905)
//!     .build()?;
//! let mut transport = ads::transport::TcpTransport::new(config.tcp_settings());
//! # use ads::transport::TransportLayer;
//! transport.open().await?;
//! let (reader, writer) = transport.into_split()?;
//! let (client, _events) = AdsClient::with_transport(config, reader, writer);
//!
//! let mut speed = Handle::scalar("MAIN.speed", PlcType::Lreal);
//! client.read(&mut speed).await?;
//! client.end().await?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use ads_core::datatypes::*;
pub use ads_core::{AdsError, AdsErrorCode, AdsResult, AmsAddress, AmsNetId, ErrorCategory};

// Re-export the handle model
pub use ads_application::{
    AdsState, DeviceInfo, DeviceState, FieldKind, FieldSpec, Handle, NotificationParams,
    TransmissionMode,
};

// Re-export client API
pub mod client {
    pub use ads_client::*;
}

// Re-export framing
pub mod ams {
    pub use ads_ams::*;
}

// Re-export transport
pub mod transport {
    pub use ads_transport::*;
}

// Re-export application layer
pub mod application {
    pub use ads_application::*;
}
