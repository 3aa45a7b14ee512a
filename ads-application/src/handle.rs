//! Client-side description of PLC symbols
//!
//! A [`Handle`] names one PLC symbol and lists the fields its memory is laid
//! out as. Field values live in the handle itself, keyed by property name;
//! [`crate::marshal`] moves them in and out of raw device bytes.

use ads_core::datatypes::PlcType;
use ads_core::{AdsError, AdsResult, PlcValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One 100 ns tick per millisecond fraction, as expected by AddNotification
pub const TICKS_PER_MILLISECOND: u32 = 10_000;

/// Field layout: a scalar PLC type or an opaque byte run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Typed(PlcType),
    Bytes(usize),
}

impl FieldKind {
    pub fn byte_length(&self) -> usize {
        match self {
            FieldKind::Typed(ty) => ty.byte_length(),
            FieldKind::Bytes(len) => *len,
        }
    }
}

/// A field of a handle: how it is laid out, and under which name it is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub name: String,
}

impl FieldSpec {
    pub fn typed(ty: PlcType, name: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Typed(ty),
            name: name.into(),
        }
    }

    pub fn bytes(len: usize, name: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Bytes(len),
            name: name.into(),
        }
    }

    pub fn byte_length(&self) -> usize {
        self.kind.byte_length()
    }
}

/// Notification transmission mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransmissionMode {
    /// Push on every cycle
    Cyclic,
    /// Push when the value changes
    OnChange,
}

impl TransmissionMode {
    pub fn as_u32(&self) -> u32 {
        match self {
            TransmissionMode::Cyclic => 3,
            TransmissionMode::OnChange => 4,
        }
    }
}

/// Notification parameters, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationParams {
    pub mode: TransmissionMode,
    pub max_delay_ms: u32,
    pub cycle_time_ms: u32,
}

impl NotificationParams {
    pub fn new(mode: TransmissionMode, max_delay_ms: u32, cycle_time_ms: u32) -> Self {
        Self {
            mode,
            max_delay_ms,
            cycle_time_ms,
        }
    }

    /// Max delay in 100 ns ticks
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidData` if the delay does not fit 32 bits of ticks.
    pub fn max_delay_ticks(&self) -> AdsResult<u32> {
        to_ticks("max delay", self.max_delay_ms)
    }

    /// Cycle time in 100 ns ticks
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidData` if the cycle time does not fit 32 bits of ticks.
    pub fn cycle_time_ticks(&self) -> AdsResult<u32> {
        to_ticks("cycle time", self.cycle_time_ms)
    }
}

fn to_ticks(what: &str, ms: u32) -> AdsResult<u32> {
    ms.checked_mul(TICKS_PER_MILLISECOND).ok_or_else(|| {
        AdsError::InvalidData(format!("{} of {} ms overflows 100 ns ticks", what, ms))
    })
}

impl Default for NotificationParams {
    fn default() -> Self {
        Self {
            mode: TransmissionMode::OnChange,
            max_delay_ms: 0,
            cycle_time_ms: 10,
        }
    }
}

/// A PLC symbol together with its field layout and current values
///
/// The device handle records the most recent resolution. Whether it is
/// still valid is decided by the session's symbol manager, never by the
/// handle, so a handle can be reused across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    symbol: String,
    fields: Vec<FieldSpec>,
    values: HashMap<String, Option<PlcValue>>,
    device_handle: Option<u32>,
    notification: NotificationParams,
}

impl Handle {
    /// Create a handle with an ordered field layout and no values
    pub fn new(symbol: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let values = fields.iter().map(|f| (f.name.clone(), None)).collect();
        Self {
            symbol: symbol.into(),
            fields,
            values,
            device_handle: None,
            notification: NotificationParams::default(),
        }
    }

    /// Handle for a symbol holding a single scalar, stored as `"value"`
    pub fn scalar(symbol: impl Into<String>, ty: PlcType) -> Self {
        Self::new(symbol, vec![FieldSpec::typed(ty, "value")])
    }

    pub fn with_notification(mut self, params: NotificationParams) -> Self {
        self.notification = params;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Sum of all field widths
    pub fn byte_length(&self) -> usize {
        self.fields.iter().map(FieldSpec::byte_length).sum()
    }

    /// Byte length as carried in a request's 32-bit length field
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidData` if the layout is larger than that.
    pub fn request_length(&self) -> AdsResult<u32> {
        let len = self.byte_length();
        u32::try_from(len).map_err(|_| {
            AdsError::InvalidData(format!(
                "Handle '{}' spans {} bytes, more than a request can carry",
                self.symbol, len
            ))
        })
    }

    pub fn device_handle(&self) -> Option<u32> {
        self.device_handle
    }

    pub fn is_resolved(&self) -> bool {
        self.device_handle.is_some()
    }

    pub fn set_device_handle(&mut self, device_handle: u32) {
        self.device_handle = Some(device_handle);
    }

    pub fn notification(&self) -> &NotificationParams {
        &self.notification
    }

    /// Current value of a field, if it holds one
    pub fn get(&self, name: &str) -> Option<&PlcValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Store a value under a declared field name
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidData` if the handle has no such field.
    pub fn set(&mut self, name: &str, value: impl Into<PlcValue>) -> AdsResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = Some(value.into());
                Ok(())
            }
            None => Err(AdsError::InvalidData(format!(
                "Handle '{}' has no field '{}'",
                self.symbol, name
            ))),
        }
    }

    /// Drop all stored values, keeping the layout
    pub fn clear_values(&mut self) {
        for slot in self.values.values_mut() {
            *slot = None;
        }
    }

    /// Field values in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&str, Option<&PlcValue>)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), self.values.get(&f.name).and_then(Option::as_ref)))
    }
}
