use crate::error::{AdsError, AdsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AMS net id identifying an ADS router on the network
///
/// Net ids are 6-byte identifiers usually written in dotted form,
/// e.g. `"192.168.1.10.1.1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmsNetId {
    bytes: [u8; 6],
}

impl AmsNetId {
    /// Length of a net id on the wire
    pub const LENGTH: usize = 6;

    /// Create a new net id from individual bytes
    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    /// Create a net id from its wire representation
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Parse a net id from its dotted string form
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidAddress` unless the string splits into
    /// exactly 6 numeric components in the range 0-255.
    pub fn parse(s: &str) -> AdsResult<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != Self::LENGTH {
            return Err(AdsError::InvalidAddress(format!(
                "'{}' does not have 6 dot-separated components",
                s
            )));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = part.parse::<u8>().map_err(|_| {
                AdsError::InvalidAddress(format!("'{}' has non-numeric component '{}'", s, part))
            })?;
        }

        Ok(Self { bytes })
    }

    /// Get the net id as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }
}

impl FromStr for AmsNetId {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AmsNetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2],
            self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

/// An AMS endpoint: net id plus ADS port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmsAddress {
    pub net_id: AmsNetId,
    pub port: u16,
}

impl AmsAddress {
    pub fn new(net_id: AmsNetId, port: u16) -> Self {
        Self { net_id, port }
    }
}

impl fmt::Display for AmsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.net_id, self.port)
    }
}
