//! Data specifications and their buffer layout.
//!
//! A [`DataSpecification`] is an ordered list of offsets to access together.
//! Offsets may repeat and need not be sorted; the order of the fields is the
//! order of the values returned by a read and expected by a write.
//!
//! ```rust
//! use fsuipc::{DataSpecification, ValueType};
//!
//! let spec = DataSpecification::new()
//!     .with(0x0560, ValueType::Int64)
//!     .with(0x0568, ValueType::Int64)
//!     .with_named("altitude", 0x0570, ValueType::Int64);
//! assert_eq!(spec.len(), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::MAX_STRING_LENGTH;
use crate::{FsuipcError, Result, ValueType};

/// One offset to read or write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Optional label, only used for display and configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub offset: u32,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Field {
    pub fn new(offset: u32, value_type: ValueType) -> Self {
        Self { name: None, offset, value_type }
    }

    pub fn named(name: impl Into<String>, offset: u32, value_type: ValueType) -> Self {
        Self { name: Some(name.into()), offset, value_type }
    }
}

impl From<(u32, ValueType)> for Field {
    fn from((offset, value_type): (u32, ValueType)) -> Self {
        Field::new(offset, value_type)
    }
}

/// Ordered list of fields accessed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSpecification {
    fields: Vec<Field>,
}

impl DataSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unnamed field.
    pub fn with(mut self, offset: u32, value_type: ValueType) -> Self {
        self.fields.push(Field::new(offset, value_type));
        self
    }

    /// Append a named field.
    pub fn with_named(mut self, name: impl Into<String>, offset: u32, value_type: ValueType) -> Self {
        self.fields.push(Field::named(name, offset, value_type));
        self
    }

    pub fn push(&mut self, field: impl Into<Field>) {
        self.fields.push(field.into());
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_deref() == Some(name))
    }

    /// Check the specification can be handed to a link.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(FsuipcError::specification(
                0,
                "list is too short, at least one element is needed",
            ));
        }

        for (index, field) in self.fields.iter().enumerate() {
            if field.value_type.size() == 0 {
                return Err(FsuipcError::specification(index, "string length must be non-zero"));
            }
            if field.value_type.size() > MAX_STRING_LENGTH as usize {
                return Err(FsuipcError::specification(
                    index,
                    format!("string length must be at most {}", MAX_STRING_LENGTH),
                ));
            }
        }

        Ok(())
    }
}

impl FromIterator<Field> for DataSpecification {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

impl FromIterator<(u32, ValueType)> for DataSpecification {
    fn from_iter<I: IntoIterator<Item = (u32, ValueType)>>(iter: I) -> Self {
        iter.into_iter().map(Field::from).collect()
    }
}

impl<'a> IntoIterator for &'a DataSpecification {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Position of one field inside a scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: u32,
    pub value_type: ValueType,
    /// Start of the field's bytes in the buffer
    pub start: usize,
}

impl Slot {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.value_type.size()
    }
}

/// Buffer layout computed once from a specification.
///
/// Read-capable layouts align every slot to its type's alignment. Write-only
/// layouts pack the slots back to back since nothing is decoded from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    slots: Vec<Slot>,
    size: usize,
    for_reading: bool,
}

impl Layout {
    pub fn new(spec: &DataSpecification, for_reading: bool) -> Result<Self> {
        spec.validate()?;

        let mut slots = Vec::with_capacity(spec.len());
        let mut size = 0usize;
        for field in spec {
            let value_type = field.value_type;
            if for_reading {
                size = align(size, value_type.alignment());
            }
            slots.push(Slot { offset: field.offset, value_type, start: size });
            size += value_type.size();
        }

        Ok(Self { slots, size, for_reading })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Total buffer size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn for_reading(&self) -> bool {
        self.for_reading
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, slot) in self.slots.iter().enumerate() {
            writeln!(f, "{:02}: offset=0x{:04x}, type={}", index, slot.offset, slot.value_type)?;
        }
        Ok(())
    }
}

/// Round `value` up to a multiple of `alignment` (a power of two).
fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_layout_aligns_slots() {
        let spec = DataSpecification::new()
            .with(0x0264, ValueType::UInt8)
            .with(0x0570, ValueType::Int64)
            .with(0x0238, ValueType::Int16)
            .with(0x3d00, ValueType::CString(7))
            .with(0x02b4, ValueType::Float32);

        let layout = Layout::new(&spec, true).unwrap();
        let starts: Vec<usize> = layout.slots().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 8, 16, 20, 28]);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn write_layout_is_packed() {
        let spec = DataSpecification::new()
            .with(0x0264, ValueType::UInt8)
            .with(0x0570, ValueType::Int64)
            .with(0x0238, ValueType::Int16);

        let layout = Layout::new(&spec, false).unwrap();
        let starts: Vec<usize> = layout.slots().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 1, 9]);
        assert_eq!(layout.size(), 11);
        assert!(!layout.for_reading());
    }

    #[test]
    fn empty_specification_is_rejected() {
        let err = Layout::new(&DataSpecification::new(), true).unwrap_err();
        assert!(matches!(err, FsuipcError::Specification { index: 0, .. }));
    }

    #[test]
    fn zero_length_string_is_rejected() {
        let spec = DataSpecification::new().with(0x0238, ValueType::Int16).with(0x3d00, ValueType::Bytes(0));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FsuipcError::Specification { index: 1, .. }));
    }

    #[test]
    fn string_longer_than_a_length_tag_is_rejected() {
        let spec = DataSpecification::new()
            .with(0x3d00, ValueType::CString(MAX_STRING_LENGTH))
            .with(0x3e00, ValueType::Bytes(MAX_STRING_LENGTH + 1));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FsuipcError::Specification { index: 1, .. }));
    }

    #[test]
    fn duplicate_offsets_keep_their_positions() {
        let spec: DataSpecification =
            [(0x0570, ValueType::Int64), (0x0570, ValueType::UInt32)].into_iter().collect();
        let layout = Layout::new(&spec, true).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.slots()[1].value_type, ValueType::UInt32);
    }

    #[test]
    fn layout_dump_lists_fields() {
        let spec = DataSpecification::new().with(0x0560, ValueType::Int64).with(0x3d00, ValueType::CString(24));
        let dump = Layout::new(&spec, true).unwrap().to_string();
        assert_eq!(dump, "00: offset=0x0560, type=l\n01: offset=0x3d00, type=-24\n");
    }

    #[test]
    fn specification_loads_from_yaml_with_hex_offsets() {
        let yaml = "- { name: latitude, offset: 0x560, type: l }\n- { offset: 0x3d00, type: -24 }\n";
        let spec: DataSpecification = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.index_of("latitude"), Some(0));
        assert_eq!(spec.fields()[0].offset, 0x560);
        assert_eq!(spec.fields()[1].value_type, ValueType::CString(24));
    }
}
