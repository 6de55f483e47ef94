//! Conversion between offset bytes and [`Value`]s.
//!
//! FSUIPC runs on x86 Windows, so fixed-width values are little-endian.
//! Strings follow the terminator policy of their [`ValueType`].

use crate::{FsuipcError, Result, Value, ValueType};

/// Decode the bytes of one slot.
///
/// `bytes` must be exactly `value_type.size()` long.
pub fn decode(value_type: ValueType, bytes: &[u8]) -> Value {
    debug_assert_eq!(bytes.len(), value_type.size());

    match value_type {
        ValueType::UInt8 => Value::UInt(bytes[0] as u64),
        ValueType::Int8 => Value::Int(bytes[0] as i8 as i64),
        ValueType::Int16 => Value::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        ValueType::UInt16 => Value::UInt(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
        ValueType::Int32 => Value::Int(i32::from_le_bytes(array(bytes)) as i64),
        ValueType::UInt32 => Value::UInt(u32::from_le_bytes(array(bytes)) as u64),
        ValueType::Int64 => Value::Int(i64::from_le_bytes(array(bytes))),
        ValueType::UInt64 => Value::UInt(u64::from_le_bytes(array(bytes))),
        ValueType::Float64 => Value::Float(f64::from_le_bytes(array(bytes))),
        ValueType::Float32 => Value::Float(f32::from_le_bytes(array(bytes)) as f64),
        ValueType::Bytes(_) => Value::Bytes(bytes.to_vec()),
        ValueType::CString(_) => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Value::Bytes(bytes[..end].to_vec())
        }
    }
}

/// Encode `value` into one slot.
///
/// `index` is the field position, used for error context. `dest` must be
/// exactly `value_type.size()` long.
pub fn encode(index: usize, value_type: ValueType, value: &Value, dest: &mut [u8]) -> Result<()> {
    debug_assert_eq!(dest.len(), value_type.size());

    match value_type {
        ValueType::UInt8 => dest.copy_from_slice(&integer::<u8>(index, value_type, value)?.to_le_bytes()),
        ValueType::Int8 => dest.copy_from_slice(&integer::<i8>(index, value_type, value)?.to_le_bytes()),
        ValueType::Int16 => dest.copy_from_slice(&integer::<i16>(index, value_type, value)?.to_le_bytes()),
        ValueType::UInt16 => dest.copy_from_slice(&integer::<u16>(index, value_type, value)?.to_le_bytes()),
        ValueType::Int32 => dest.copy_from_slice(&integer::<i32>(index, value_type, value)?.to_le_bytes()),
        ValueType::UInt32 => dest.copy_from_slice(&integer::<u32>(index, value_type, value)?.to_le_bytes()),
        ValueType::Int64 => dest.copy_from_slice(&integer::<i64>(index, value_type, value)?.to_le_bytes()),
        ValueType::UInt64 => dest.copy_from_slice(&integer::<u64>(index, value_type, value)?.to_le_bytes()),
        ValueType::Float64 => dest.copy_from_slice(&float(index, value)?.to_le_bytes()),
        ValueType::Float32 => dest.copy_from_slice(&(float(index, value)? as f32).to_le_bytes()),
        ValueType::Bytes(_) => {
            let src = bytes(index, value_type, value)?;
            dest.fill(0);
            let n = src.len().min(dest.len());
            dest[..n].copy_from_slice(&src[..n]);
        }
        ValueType::CString(_) => {
            let src = bytes(index, value_type, value)?;
            dest.fill(0);
            let n = src.iter().position(|&b| b == 0).unwrap_or(src.len()).min(dest.len());
            dest[..n].copy_from_slice(&src[..n]);
            if let Some(last) = dest.last_mut() {
                *last = 0;
            }
        }
    }

    Ok(())
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn integer<T>(index: usize, value_type: ValueType, value: &Value) -> Result<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let converted = match value {
        Value::Int(v) => <T as TryFrom<i64>>::try_from(*v).ok(),
        Value::UInt(v) => <T as TryFrom<u64>>::try_from(*v).ok(),
        other => {
            return Err(FsuipcError::type_conversion(
                index,
                format!("integer expected for type {}, got {}", value_type, other.kind()),
            ));
        }
    };

    converted.ok_or_else(|| {
        FsuipcError::type_conversion(index, format!("{} does not fit type {}", value, value_type))
    })
}

fn float(index: usize, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        FsuipcError::type_conversion(index, format!("float expected, got {}", value.kind()))
    })
}

fn bytes(index: usize, value_type: ValueType, value: &Value) -> Result<&[u8]> {
    value.as_bytes().ok_or_else(|| {
        FsuipcError::type_conversion(
            index,
            format!("bytes expected for string type {}, got {}", value_type, value.kind()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(value_type: ValueType, value: impl Into<Value>) -> Result<Vec<u8>> {
        let mut buf = vec![0xAA; value_type.size()];
        encode(0, value_type, &value.into(), &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn decodes_little_endian_integers() {
        assert_eq!(decode(ValueType::Int16, &[0xfe, 0xff]), Value::Int(-2));
        assert_eq!(decode(ValueType::UInt16, &[0xfe, 0xff]), Value::UInt(0xfffe));
        assert_eq!(decode(ValueType::Int8, &[0x80]), Value::Int(-128));
        assert_eq!(decode(ValueType::UInt32, &[1, 0, 0, 0x80]), Value::UInt(0x8000_0001));
    }

    #[test]
    fn float32_widens_to_f64() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(decode(ValueType::Float32, &bytes), Value::Float(1.5));
    }

    #[test]
    fn cstring_stops_at_terminator() {
        assert_eq!(decode(ValueType::CString(6), b"EGLL\0x"), Value::Bytes(b"EGLL".to_vec()));
        assert_eq!(decode(ValueType::CString(4), b"KJFK"), Value::Bytes(b"KJFK".to_vec()));
        assert_eq!(decode(ValueType::Bytes(6), b"EGLL\0x"), Value::Bytes(b"EGLL\0x".to_vec()));
    }

    #[test]
    fn cstring_encoding_forces_terminator() {
        assert_eq!(encoded(ValueType::CString(4), "KJFK").unwrap(), b"KJF\0".to_vec());
        assert_eq!(encoded(ValueType::CString(6), "EG").unwrap(), b"EG\0\0\0\0".to_vec());
        assert_eq!(encoded(ValueType::CString(6), &b"A\0B"[..]).unwrap(), b"A\0\0\0\0\0".to_vec());
    }

    #[test]
    fn fixed_bytes_are_zero_padded_or_truncated() {
        assert_eq!(encoded(ValueType::Bytes(4), "AB").unwrap(), b"AB\0\0".to_vec());
        assert_eq!(encoded(ValueType::Bytes(2), "ABCD").unwrap(), b"AB".to_vec());
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(encoded(ValueType::UInt8, 255u32).unwrap(), vec![255]);
        assert!(matches!(
            encoded(ValueType::UInt8, 256u32),
            Err(FsuipcError::TypeConversion { index: 0, .. })
        ));
        assert!(encoded(ValueType::UInt16, -1i32).is_err());
        assert_eq!(encoded(ValueType::Int16, 7u64).unwrap(), vec![7, 0]);
    }

    #[test]
    fn type_mismatches_are_rejected() {
        assert!(encoded(ValueType::Float64, 1i32).is_err());
        assert!(encoded(ValueType::Int32, 1.0f64).is_err());
        assert!(encoded(ValueType::CString(8), 1u8).is_err());
    }

    proptest! {
        #[test]
        fn int64_survives_encode_decode(v in any::<i64>()) {
            let bytes = encoded(ValueType::Int64, v).unwrap();
            prop_assert_eq!(decode(ValueType::Int64, &bytes), Value::Int(v));
        }

        #[test]
        fn encoding_fills_exactly_the_slot(
            text in prop::collection::vec(1u8..=255u8, 0..40),
            len in 1u32..32u32,
        ) {
            let bytes = encoded(ValueType::CString(len), text.clone()).unwrap();
            prop_assert_eq!(bytes.len(), len as usize);
            prop_assert_eq!(bytes[len as usize - 1], 0);
            let decoded = decode(ValueType::CString(len), &bytes);
            let keep = text.len().min(len as usize - 1);
            prop_assert_eq!(decoded, Value::Bytes(text[..keep].to_vec()));
        }
    }
}
