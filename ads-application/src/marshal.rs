//! Value marshalling between handles and raw device bytes
//!
//! Fields are laid out back to back in declaration order; each one starts
//! where the previous one ended.

use crate::handle::{FieldKind, Handle};
use ads_core::{AdsError, AdsResult, PlcValue};
use bytes::{BufMut, Bytes, BytesMut};

/// Decode `raw` into the handle's fields
///
/// Values are only stored once every field decoded, so a short buffer
/// leaves the handle untouched.
///
/// # Errors
///
/// Returns `AdsError::InvalidData` if `raw` is shorter than the layout.
pub fn decode(handle: &mut Handle, raw: &[u8]) -> AdsResult<()> {
    let mut decoded = Vec::with_capacity(handle.fields().len());
    let mut offset = 0;

    for field in handle.fields() {
        let width = field.byte_length();
        let end = offset + width;
        if raw.len() < end {
            return Err(AdsError::InvalidData(format!(
                "Field '{}' of '{}' needs bytes {}..{}, buffer holds {}",
                field.name,
                handle.symbol(),
                offset,
                end,
                raw.len()
            )));
        }

        let slice = &raw[offset..end];
        let value = match &field.kind {
            FieldKind::Typed(ty) => ty.decode(slice)?,
            FieldKind::Bytes(_) => PlcValue::Raw(slice.to_vec()),
        };
        decoded.push((field.name.clone(), value));
        offset = end;
    }

    for (name, value) in decoded {
        handle.set(&name, value)?;
    }
    Ok(())
}

/// Encode the handle's field values into one contiguous buffer
///
/// # Errors
///
/// - `AdsError::MissingFieldValue` if a field holds no value
/// - `AdsError::TypeMismatch` if a value does not fit its field type
/// - `AdsError::StringTooLong` if a string exceeds its capacity
pub fn encode(handle: &Handle) -> AdsResult<Bytes> {
    let mut out = BytesMut::with_capacity(handle.byte_length());

    for field in handle.fields() {
        let value = handle
            .get(&field.name)
            .ok_or_else(|| AdsError::MissingFieldValue(field.name.clone()))?;

        match &field.kind {
            FieldKind::Typed(ty) => ty.encode(&field.name, value, &mut out)?,
            FieldKind::Bytes(len) => {
                let bytes = value.as_bytes().ok_or_else(|| AdsError::TypeMismatch {
                    field: field.name.clone(),
                    expected: format!("{} raw bytes", len),
                    actual: value.kind().to_string(),
                })?;
                if bytes.len() > *len {
                    return Err(AdsError::InvalidData(format!(
                        "Field '{}' holds {} bytes, layout allows {}",
                        field.name,
                        bytes.len(),
                        len
                    )));
                }
                out.put_slice(bytes);
                out.put_bytes(0, len - bytes.len());
            }
        }
    }

    Ok(out.freeze())
}
