//! Application layer for the ADS protocol
//!
//! This crate sits between the AMS framing layer and the client:
//!
//! - [`pdu`]: request/response payloads of the supported ADS commands
//! - [`index_group`]: well-known index groups
//! - [`handle`]: the client-side description of a PLC symbol
//! - [`marshal`]: typed value encoding/decoding against a handle
//! - [`notification`]: parsing of device notification pushes
//! - [`state`]: ADS device states

pub mod handle;
pub mod index_group;
pub mod marshal;
pub mod notification;
pub mod pdu;
pub mod state;

pub use ads_core::{AdsError, AdsResult};
pub use handle::{FieldKind, FieldSpec, Handle, NotificationParams, TransmissionMode};
pub use notification::{NotificationSample, NotificationStamp, NotificationStream};
pub use pdu::DeviceInfo;
pub use state::{AdsState, DeviceState};
