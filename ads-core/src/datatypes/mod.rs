//! Data types used by the ADS value marshaller

pub mod plc_type;
pub mod plc_value;

pub use plc_type::{PlcType, DEFAULT_STRING_LENGTH};
pub use plc_value::{PlcTime, PlcValue};
