//! PLC scalar type registry

use crate::datatypes::plc_value::{PlcTime, PlcValue};
use crate::error::{AdsError, AdsResult};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default capacity of a `STRING` without explicit length (80 chars + NUL)
pub const DEFAULT_STRING_LENGTH: usize = 81;

/// PLC scalar types understood by the value marshaller
///
/// Each variant knows its byte width and how to encode/decode itself
/// (all multi-byte types are little-endian on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlcType {
    Bool,
    Byte,
    Word,
    Dword,
    Sint,
    Usint,
    Int,
    Uint,
    Dint,
    Udint,
    Lint,
    Ulint,
    Real,
    Lreal,
    Time,
    TimeOfDay,
    Date,
    DateAndTime,
    /// Fixed-capacity string, capacity in bytes including the terminator
    String(usize),
}

impl PlcType {
    /// `STRING` with the default capacity
    pub fn string() -> Self {
        PlcType::String(DEFAULT_STRING_LENGTH)
    }

    /// Size of the type on the wire
    pub fn byte_length(&self) -> usize {
        match self {
            PlcType::Bool | PlcType::Byte | PlcType::Sint | PlcType::Usint => 1,
            PlcType::Word | PlcType::Int | PlcType::Uint => 2,
            PlcType::Dword
            | PlcType::Dint
            | PlcType::Udint
            | PlcType::Real
            | PlcType::Time
            | PlcType::TimeOfDay
            | PlcType::Date
            | PlcType::DateAndTime => 4,
            PlcType::Lint | PlcType::Ulint | PlcType::Lreal => 8,
            PlcType::String(len) => *len,
        }
    }

    /// IEC 61131-3 name of the type
    pub fn name(&self) -> &'static str {
        match self {
            PlcType::Bool => "BOOL",
            PlcType::Byte => "BYTE",
            PlcType::Word => "WORD",
            PlcType::Dword => "DWORD",
            PlcType::Sint => "SINT",
            PlcType::Usint => "USINT",
            PlcType::Int => "INT",
            PlcType::Uint => "UINT",
            PlcType::Dint => "DINT",
            PlcType::Udint => "UDINT",
            PlcType::Lint => "LINT",
            PlcType::Ulint => "ULINT",
            PlcType::Real => "REAL",
            PlcType::Lreal => "LREAL",
            PlcType::Time => "TIME",
            PlcType::TimeOfDay => "TIME_OF_DAY",
            PlcType::Date => "DATE",
            PlcType::DateAndTime => "DATE_AND_TIME",
            PlcType::String(_) => "STRING",
        }
    }

    /// Decode one value of this type from the start of `data`
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidData` if `data` is shorter than the type.
    pub fn decode(&self, data: &[u8]) -> AdsResult<PlcValue> {
        let len = self.byte_length();
        if data.len() < len {
            return Err(AdsError::InvalidData(format!(
                "{} needs {} bytes, got {}",
                self,
                len,
                data.len()
            )));
        }

        let mut buf = &data[..len];
        let value = match self {
            PlcType::Bool | PlcType::Byte | PlcType::Usint => PlcValue::UInt8(buf.get_u8()),
            PlcType::Sint => PlcValue::Int8(buf.get_i8()),
            PlcType::Word | PlcType::Uint => PlcValue::UInt16(buf.get_u16_le()),
            PlcType::Int => PlcValue::Int16(buf.get_i16_le()),
            PlcType::Dword | PlcType::Udint => PlcValue::UInt32(buf.get_u32_le()),
            PlcType::Dint => PlcValue::Int32(buf.get_i32_le()),
            PlcType::Lint => PlcValue::Int64(buf.get_i64_le()),
            PlcType::Ulint => PlcValue::UInt64(buf.get_u64_le()),
            PlcType::Real => PlcValue::Real(buf.get_f32_le()),
            PlcType::Lreal => PlcValue::LReal(buf.get_f64_le()),
            PlcType::Time | PlcType::TimeOfDay | PlcType::Date | PlcType::DateAndTime => {
                PlcValue::Time(PlcTime::from_seconds(buf.get_u32_le()))
            }
            PlcType::String(_) => {
                let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                PlcValue::String(String::from_utf8_lossy(&buf[..end]).into_owned())
            }
        };
        Ok(value)
    }

    /// Append the wire form of `value` to `out`
    ///
    /// # Errors
    ///
    /// - `AdsError::TypeMismatch` if `value` is not a value of this type
    /// - `AdsError::StringTooLong` if a string does not fit with its terminator
    pub fn encode(&self, field: &str, value: &PlcValue, out: &mut BytesMut) -> AdsResult<()> {
        match (self, value) {
            (PlcType::Bool, PlcValue::Bool(v)) => out.put_u8(u8::from(*v)),
            (PlcType::Bool | PlcType::Byte | PlcType::Usint, PlcValue::UInt8(v)) => out.put_u8(*v),
            (PlcType::Sint, PlcValue::Int8(v)) => out.put_i8(*v),
            (PlcType::Word | PlcType::Uint, PlcValue::UInt16(v)) => out.put_u16_le(*v),
            (PlcType::Int, PlcValue::Int16(v)) => out.put_i16_le(*v),
            (PlcType::Dword | PlcType::Udint, PlcValue::UInt32(v)) => out.put_u32_le(*v),
            (PlcType::Dint, PlcValue::Int32(v)) => out.put_i32_le(*v),
            (PlcType::Lint, PlcValue::Int64(v)) => out.put_i64_le(*v),
            (PlcType::Ulint, PlcValue::UInt64(v)) => out.put_u64_le(*v),
            (PlcType::Real, PlcValue::Real(v)) => out.put_f32_le(*v),
            (PlcType::Lreal, PlcValue::LReal(v)) => out.put_f64_le(*v),
            (
                PlcType::Time | PlcType::TimeOfDay | PlcType::Date | PlcType::DateAndTime,
                PlcValue::Time(t),
            ) => out.put_u32_le(t.seconds()),
            (PlcType::String(capacity), PlcValue::String(s)) => {
                let bytes = s.as_bytes();
                if bytes.len() >= *capacity {
                    return Err(AdsError::StringTooLong {
                        len: bytes.len(),
                        capacity: *capacity,
                    });
                }
                out.put_slice(bytes);
                out.put_bytes(0, capacity - bytes.len());
            }
            _ => {
                return Err(AdsError::TypeMismatch {
                    field: field.to_string(),
                    expected: self.to_string(),
                    actual: value.kind().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for PlcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcType::String(len) => write!(f, "STRING({})", len),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for PlcType {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let ty = match upper.as_str() {
            "BOOL" => PlcType::Bool,
            "BYTE" => PlcType::Byte,
            "WORD" => PlcType::Word,
            "DWORD" => PlcType::Dword,
            "SINT" => PlcType::Sint,
            "USINT" => PlcType::Usint,
            "INT" => PlcType::Int,
            "UINT" => PlcType::Uint,
            "DINT" => PlcType::Dint,
            "UDINT" => PlcType::Udint,
            "LINT" => PlcType::Lint,
            "ULINT" => PlcType::Ulint,
            "REAL" => PlcType::Real,
            "LREAL" => PlcType::Lreal,
            "TIME" => PlcType::Time,
            "TIME_OF_DAY" | "TOD" => PlcType::TimeOfDay,
            "DATE" => PlcType::Date,
            "DATE_AND_TIME" | "DT" => PlcType::DateAndTime,
            "STRING" => PlcType::string(),
            other => {
                let len = other
                    .strip_prefix("STRING(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| AdsError::InvalidData(format!("Unknown PLC type: {}", s)))?;
                PlcType::String(len)
            }
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_lengths() {
        assert_eq!(PlcType::Bool.byte_length(), 1);
        assert_eq!(PlcType::Int.byte_length(), 2);
        assert_eq!(PlcType::DateAndTime.byte_length(), 4);
        assert_eq!(PlcType::Lreal.byte_length(), 8);
        assert_eq!(PlcType::string().byte_length(), 81);
        assert_eq!(PlcType::String(20).byte_length(), 20);
    }

    #[test]
    fn test_decode_signed_little_endian() {
        assert_eq!(PlcType::Int.decode(&[0xFE, 0xFF]).unwrap(), PlcValue::Int16(-2));
        assert_eq!(
            PlcType::Dint.decode(&[0x00, 0x00, 0x00, 0x80]).unwrap(),
            PlcValue::Int32(i32::MIN)
        );
        assert_eq!(PlcType::Sint.decode(&[0x80]).unwrap(), PlcValue::Int8(-128));
    }

    #[test]
    fn test_decode_real() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(PlcType::Real.decode(&bytes).unwrap(), PlcValue::Real(1.5));
    }

    #[test]
    fn test_decode_too_short() {
        assert!(matches!(
            PlcType::Dword.decode(&[1, 2]),
            Err(AdsError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_string_stops_at_nul() {
        let mut raw = b"hello".to_vec();
        raw.resize(10, 0);
        raw[7] = b'x';
        assert_eq!(
            PlcType::String(10).decode(&raw).unwrap(),
            PlcValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_bool_keeps_raw_byte() {
        assert_eq!(PlcType::Bool.decode(&[0x02]).unwrap(), PlcValue::UInt8(2));

        let mut out = BytesMut::new();
        PlcType::Bool.encode("b", &PlcValue::UInt8(2), &mut out).unwrap();
        PlcType::Bool.encode("b", &PlcValue::Bool(true), &mut out).unwrap();
        assert_eq!(&out[..], &[0x02, 0x01]);
    }

    #[test]
    fn test_encode_byte() {
        let mut out = BytesMut::new();
        PlcType::Byte.encode("v", &PlcValue::UInt8(200), &mut out).unwrap();
        assert_eq!(&out[..], &[0xC8]);
    }

    #[test]
    fn test_encode_string_pads() {
        let mut out = BytesMut::new();
        PlcType::String(6)
            .encode("s", &PlcValue::String("abc".to_string()), &mut out)
            .unwrap();
        assert_eq!(&out[..], b"abc\0\0\0");

        let mut out = BytesMut::new();
        let err = PlcType::String(3)
            .encode("s", &PlcValue::String("abc".to_string()), &mut out)
            .unwrap_err();
        assert!(matches!(err, AdsError::StringTooLong { len: 3, capacity: 3 }));
    }

    #[test]
    fn test_encode_type_mismatch() {
        let mut out = BytesMut::new();
        let err = PlcType::Int.encode("speed", &PlcValue::Real(1.0), &mut out).unwrap_err();
        match err {
            AdsError::TypeMismatch { field, expected, .. } => {
                assert_eq!(field, "speed");
                assert_eq!(expected, "INT");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("lreal".parse::<PlcType>().unwrap(), PlcType::Lreal);
        assert_eq!("TIME_OF_DAY".parse::<PlcType>().unwrap(), PlcType::TimeOfDay);
        assert_eq!("STRING".parse::<PlcType>().unwrap(), PlcType::String(81));
        assert_eq!("STRING(20)".parse::<PlcType>().unwrap(), PlcType::String(20));
        assert!("STRING(0)".parse::<PlcType>().is_err());
        assert!("FLOAT".parse::<PlcType>().is_err());
    }
}
