//! Offset type tags

use serde::{Deserialize, Serialize};

use crate::{FsuipcError, Result};

/// Type of the value stored at an FSUIPC offset.
///
/// Fixed-width types are written as a single letter, strings as a signed
/// length: positive for a fixed-length byte string without terminator,
/// negative for a zero-terminated string whose absolute value is the
/// maximum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeTag", into = "TypeTag")]
pub enum ValueType {
    /// `b`: 1 byte unsigned
    UInt8,
    /// `c`: 1 byte signed
    Int8,
    /// `h`: 2 byte signed
    Int16,
    /// `H`: 2 byte unsigned
    UInt16,
    /// `d`: 4 byte signed
    Int32,
    /// `u`: 4 byte unsigned
    UInt32,
    /// `l`: 8 byte signed
    Int64,
    /// `L`: 8 byte unsigned
    UInt64,
    /// `f`: 8 byte double
    Float64,
    /// `F`: 4 byte float
    Float32,
    /// Fixed-length byte string
    Bytes(u32),
    /// Zero-terminated string with a maximum length (terminator included)
    CString(u32),
}

/// String alignment used by the SDK wrapper for variable-length types.
const STRING_ALIGNMENT: usize = 4;

/// Longest string a signed 32-bit length tag can describe.
pub const MAX_STRING_LENGTH: u32 = i32::MAX as u32;

impl ValueType {
    /// Parse a single type letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        let value_type = match letter {
            'b' => ValueType::UInt8,
            'c' => ValueType::Int8,
            'h' => ValueType::Int16,
            'H' => ValueType::UInt16,
            'd' => ValueType::Int32,
            'u' => ValueType::UInt32,
            'l' => ValueType::Int64,
            'L' => ValueType::UInt64,
            'f' => ValueType::Float64,
            'F' => ValueType::Float32,
            _ => return None,
        };
        Some(value_type)
    }

    /// Build a string type from a signed length tag.
    ///
    /// Returns `None` for a zero length or one longer than
    /// [`MAX_STRING_LENGTH`].
    pub fn from_length(length: i64) -> Option<Self> {
        let n = u32::try_from(length.unsigned_abs())
            .ok()
            .filter(|n| (1..=MAX_STRING_LENGTH).contains(n))?;
        if length > 0 { Some(ValueType::Bytes(n)) } else { Some(ValueType::CString(n)) }
    }

    /// The type letter, or `None` for string types.
    pub const fn letter(&self) -> Option<char> {
        match self {
            ValueType::UInt8 => Some('b'),
            ValueType::Int8 => Some('c'),
            ValueType::Int16 => Some('h'),
            ValueType::UInt16 => Some('H'),
            ValueType::Int32 => Some('d'),
            ValueType::UInt32 => Some('u'),
            ValueType::Int64 => Some('l'),
            ValueType::UInt64 => Some('L'),
            ValueType::Float64 => Some('f'),
            ValueType::Float32 => Some('F'),
            ValueType::Bytes(_) | ValueType::CString(_) => None,
        }
    }

    /// Number of bytes transferred for this type.
    pub const fn size(&self) -> usize {
        match self {
            ValueType::UInt8 | ValueType::Int8 => 1,
            ValueType::Int16 | ValueType::UInt16 => 2,
            ValueType::Int32 | ValueType::UInt32 | ValueType::Float32 => 4,
            ValueType::Int64 | ValueType::UInt64 | ValueType::Float64 => 8,
            ValueType::Bytes(n) | ValueType::CString(n) => *n as usize,
        }
    }

    /// Alignment of the value inside a read buffer.
    pub const fn alignment(&self) -> usize {
        match self {
            ValueType::Bytes(_) | ValueType::CString(_) => STRING_ALIGNMENT,
            other => other.size(),
        }
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, ValueType::Bytes(_) | ValueType::CString(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, ValueType::Float32 | ValueType::Float64)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Bytes(n) => write!(f, "{}", n),
            ValueType::CString(n) => write!(f, "-{}", n),
            other => match other.letter() {
                Some(letter) => write!(f, "{}", letter),
                None => Ok(()),
            },
        }
    }
}

impl std::str::FromStr for ValueType {
    type Err = FsuipcError;

    fn from_str(s: &str) -> Result<Self> {
        TypeTag::Letter(s.to_string()).try_into()
    }
}

/// Serialized form of a [`ValueType`]: a letter or a signed string length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TypeTag {
    Length(i64),
    Letter(String),
}

impl TryFrom<TypeTag> for ValueType {
    type Error = FsuipcError;

    fn try_from(tag: TypeTag) -> Result<Self> {
        match tag {
            TypeTag::Length(length) => ValueType::from_length(length)
                .ok_or_else(|| {
                    FsuipcError::specification(
                        0,
                        format!(
                            "string length must be between 1 and {}, got {}",
                            MAX_STRING_LENGTH,
                            length.unsigned_abs()
                        ),
                    )
                }),
            TypeTag::Letter(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => ValueType::from_letter(letter).ok_or_else(|| {
                        FsuipcError::specification(0, format!("invalid type letter: {}", letter))
                    }),
                    _ => match text.parse::<i64>() {
                        Ok(length) => TypeTag::Length(length).try_into(),
                        Err(_) => Err(FsuipcError::specification(
                            0,
                            format!("type string should be of length 1, got {:?}", text),
                        )),
                    },
                }
            }
        }
    }
}

impl From<ValueType> for TypeTag {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bytes(n) => TypeTag::Length(i64::from(n)),
            ValueType::CString(n) => TypeTag::Length(-i64::from(n)),
            other => TypeTag::Letter(other.to_string()),
        }
    }
}
