//! In-memory PLC values

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds count carried by TIME, TIME_OF_DAY, DATE and DATE_AND_TIME
///
/// The raw count is preserved exactly. Interpreting it as a calendar time is
/// best-effort: the PLC stores wall-clock seconds without a zone, so
/// [`PlcTime::to_local`] shifts by the host's local UTC offset at that
/// instant, which is only correct when PLC and host share a time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlcTime {
    seconds: u32,
}

impl PlcTime {
    pub fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    /// Raw seconds count as found on the wire
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// The seconds count read as a Unix timestamp
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(i64::from(self.seconds), 0)
    }

    /// Best-effort conversion treating the count as local wall-clock time
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        let wall_clock = self.as_utc()?.naive_utc();
        Local.from_local_datetime(&wall_clock).earliest()
    }
}

impl fmt::Display for PlcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_utc() {
            Some(dt) => write!(f, "{}", dt.naive_utc()),
            None => write!(f, "{}s", self.seconds),
        }
    }
}

/// A decoded PLC value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlcValue {
    /// BOOL
    Bool(bool),
    /// BYTE, USINT
    UInt8(u8),
    /// SINT
    Int8(i8),
    /// WORD, UINT
    UInt16(u16),
    /// INT
    Int16(i16),
    /// DWORD, UDINT
    UInt32(u32),
    /// DINT
    Int32(i32),
    /// ULINT
    UInt64(u64),
    /// LINT
    Int64(i64),
    /// REAL
    Real(f32),
    /// LREAL
    LReal(f64),
    /// TIME, TIME_OF_DAY, DATE, DATE_AND_TIME
    Time(PlcTime),
    /// STRING(n)
    String(String),
    /// Opaque fixed-length buffer
    Raw(Vec<u8>),
}

impl PlcValue {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PlcValue::Bool(_) => "Bool",
            PlcValue::UInt8(_) => "UInt8",
            PlcValue::Int8(_) => "Int8",
            PlcValue::UInt16(_) => "UInt16",
            PlcValue::Int16(_) => "Int16",
            PlcValue::UInt32(_) => "UInt32",
            PlcValue::Int32(_) => "Int32",
            PlcValue::UInt64(_) => "UInt64",
            PlcValue::Int64(_) => "Int64",
            PlcValue::Real(_) => "Real",
            PlcValue::LReal(_) => "LReal",
            PlcValue::Time(_) => "Time",
            PlcValue::String(_) => "String",
            PlcValue::Raw(_) => "Raw",
        }
    }

    /// Integer view of any integral variant
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PlcValue::Bool(b) => Some(i64::from(*b)),
            PlcValue::UInt8(v) => Some(i64::from(*v)),
            PlcValue::Int8(v) => Some(i64::from(*v)),
            PlcValue::UInt16(v) => Some(i64::from(*v)),
            PlcValue::Int16(v) => Some(i64::from(*v)),
            PlcValue::UInt32(v) => Some(i64::from(*v)),
            PlcValue::Int32(v) => Some(i64::from(*v)),
            PlcValue::UInt64(v) => i64::try_from(*v).ok(),
            PlcValue::Int64(v) => Some(*v),
            PlcValue::Time(t) => Some(i64::from(t.seconds())),
            _ => None,
        }
    }

    /// Floating-point view of any numeric variant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PlcValue::Real(v) => Some(f64::from(*v)),
            PlcValue::LReal(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlcValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlcValue::Raw(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PlcValue {
                fn from(v: $ty) -> Self {
                    PlcValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    f32 => Real,
    f64 => LReal,
    PlcTime => Time,
    String => String,
    Vec<u8> => Raw,
}

impl From<&str> for PlcValue {
    fn from(v: &str) -> Self {
        PlcValue::String(v.to_string())
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcValue::Bool(v) => write!(f, "{}", v),
            PlcValue::UInt8(v) => write!(f, "{}", v),
            PlcValue::Int8(v) => write!(f, "{}", v),
            PlcValue::UInt16(v) => write!(f, "{}", v),
            PlcValue::Int16(v) => write!(f, "{}", v),
            PlcValue::UInt32(v) => write!(f, "{}", v),
            PlcValue::Int32(v) => write!(f, "{}", v),
            PlcValue::UInt64(v) => write!(f, "{}", v),
            PlcValue::Int64(v) => write!(f, "{}", v),
            PlcValue::Real(v) => write!(f, "{}", v),
            PlcValue::LReal(v) => write!(f, "{}", v),
            PlcValue::Time(t) => write!(f, "{}", t),
            PlcValue::String(s) => write!(f, "{}", s),
            PlcValue::Raw(bytes) => {
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}
