//! Core types and utilities for ADS/AMS protocol
//!
//! This crate provides fundamental types, error handling, and utilities
//! used throughout the ADS client implementation:
//!
//! - [`AdsError`] / [`AdsResult`]: the error taxonomy shared by every layer
//! - [`AmsNetId`] / [`AmsAddress`]: AMS addressing
//! - [`AdsErrorCode`]: translation of ADS return codes
//! - [`datatypes`]: the PLC scalar type registry and in-memory values

pub mod error;
pub mod error_code;
pub mod net_id;
pub mod datatypes;

pub use error::{AdsError, AdsResult};
pub use error_code::{AdsErrorCode, ErrorCategory};
pub use net_id::{AmsAddress, AmsNetId};
pub use datatypes::{PlcType, PlcValue};
