//! Dynamic field values.
//!
//! Row fields and patch entries are lowered into [`Value`], a closed set of
//! value kinds:
//! - signed, unsigned and floating point numbers, keeping their width
//! - strings and booleans
//! - timestamps, UUIDs and nullable UUIDs, compared by canonical text
//! - nullable pointers (`Option<T>`) and slices (`Vec<T>`), which carry their
//!   element type so that a `None` or an empty vector is still typed
//! - opaque values, compared with their own `PartialEq`

mod canonical;
mod convert;
mod opaque;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use chrono::{DateTime, FixedOffset};
use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};
use uuid::Uuid;

pub use canonical::{CanonicalText, NullUuid};
pub use convert::ToValue;
pub use opaque::{Opaque, OpaqueType, OpaqueValue};

/// Signed integer of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Int {
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `isize`
    Isize(isize),
}

impl Int {
    /// The runtime type of this integer.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Int::I8(_) => ValueType::I8,
            Int::I16(_) => ValueType::I16,
            Int::I32(_) => ValueType::I32,
            Int::I64(_) => ValueType::I64,
            Int::Isize(_) => ValueType::Isize,
        }
    }

    /// Widened value, for display and zero checks.
    #[must_use]
    pub fn get(self) -> i128 {
        match self {
            Int::I8(v) => i128::from(v),
            Int::I16(v) => i128::from(v),
            Int::I32(v) => i128::from(v),
            Int::I64(v) => i128::from(v),
            Int::Isize(v) => v as i128,
        }
    }
}

/// Unsigned integer of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uint {
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `usize`
    Usize(usize),
}

impl Uint {
    /// The runtime type of this integer.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Uint::U8(_) => ValueType::U8,
            Uint::U16(_) => ValueType::U16,
            Uint::U32(_) => ValueType::U32,
            Uint::U64(_) => ValueType::U64,
            Uint::Usize(_) => ValueType::Usize,
        }
    }

    /// Widened value, for display and zero checks.
    #[must_use]
    pub fn get(self) -> u128 {
        match self {
            Uint::U8(v) => u128::from(v),
            Uint::U16(v) => u128::from(v),
            Uint::U32(v) => u128::from(v),
            Uint::U64(v) => u128::from(v),
            Uint::Usize(v) => v as u128,
        }
    }
}

/// Floating point number of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Float {
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
}

impl Float {
    /// The runtime type of this float.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Float::F32(_) => ValueType::F32,
            Float::F64(_) => ValueType::F64,
        }
    }

    /// Widened value.
    #[must_use]
    pub fn get(self) -> f64 {
        match self {
            Float::F32(v) => f64::from(v),
            Float::F64(v) => v,
        }
    }
}

/// Runtime type of a [`Value`].
///
/// Two values are only comparable when their runtime types are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String`
    String,
    /// `bool`
    Bool,
    /// A timestamp with offset.
    Timestamp,
    /// A UUID.
    Uuid,
    /// A nullable UUID.
    NullUuid,
    /// Nullable pointer to the element type.
    Ptr(Box<ValueType>),
    /// Slice of the element type.
    Slice(Box<ValueType>),
    /// A type outside the enumerated kinds.
    Opaque(OpaqueType),
}

impl ValueType {
    /// Nullable pointer to `elem`.
    #[must_use]
    pub fn ptr(elem: ValueType) -> Self {
        ValueType::Ptr(Box::new(elem))
    }

    /// Slice of `elem`.
    #[must_use]
    pub fn slice(elem: ValueType) -> Self {
        ValueType::Slice(Box::new(elem))
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::I8 => f.write_str("i8"),
            ValueType::I16 => f.write_str("i16"),
            ValueType::I32 => f.write_str("i32"),
            ValueType::I64 => f.write_str("i64"),
            ValueType::Isize => f.write_str("isize"),
            ValueType::U8 => f.write_str("u8"),
            ValueType::U16 => f.write_str("u16"),
            ValueType::U32 => f.write_str("u32"),
            ValueType::U64 => f.write_str("u64"),
            ValueType::Usize => f.write_str("usize"),
            ValueType::F32 => f.write_str("f32"),
            ValueType::F64 => f.write_str("f64"),
            ValueType::String => f.write_str("String"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Timestamp => f.write_str("DateTime"),
            ValueType::Uuid => f.write_str("Uuid"),
            ValueType::NullUuid => f.write_str("NullUuid"),
            ValueType::Ptr(elem) => write!(f, "Option<{elem}>"),
            ValueType::Slice(elem) => write!(f, "Vec<{elem}>"),
            ValueType::Opaque(ty) => f.write_str(ty.name()),
        }
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer.
    Int(Int),
    /// Unsigned integer.
    Uint(Uint),
    /// Floating point number.
    Float(Float),
    /// UTF-8 text.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Timestamp with offset.
    Timestamp(DateTime<FixedOffset>),
    /// UUID.
    Uuid(Uuid),
    /// Nullable UUID.
    NullUuid(NullUuid),
    /// Nullable pointer: element type plus the pointee, if set.
    Ptr(ValueType, Option<Box<Value>>),
    /// Slice: element type plus the elements.
    Slice(ValueType, Vec<Value>),
    /// Any other type.
    Opaque(Opaque),
}

impl Value {
    /// A nil pointer to `elem`.
    #[must_use]
    pub const fn nil(elem: ValueType) -> Self {
        Value::Ptr(elem, None)
    }

    /// The runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(v) => v.value_type(),
            Value::Uint(v) => v.value_type(),
            Value::Float(v) => v.value_type(),
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Uuid(_) => ValueType::Uuid,
            Value::NullUuid(_) => ValueType::NullUuid,
            Value::Ptr(elem, _) => ValueType::ptr(elem.clone()),
            Value::Slice(elem, _) => ValueType::slice(elem.clone()),
            Value::Opaque(v) => ValueType::Opaque(v.opaque_type()),
        }
    }

    /// Whether this is a nil pointer.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Ptr(_, None))
    }

    /// Whether the value equals the `Default` of its Rust type.
    ///
    /// Empty slices count as zero; the zero timestamp is the Unix epoch.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(v) => v.get() == 0,
            Value::Uint(v) => v.get() == 0,
            Value::Float(Float::F32(v)) => v.to_bits() == 0,
            Value::Float(Float::F64(v)) => v.to_bits() == 0,
            Value::String(v) => v.is_empty(),
            Value::Bool(v) => !v,
            Value::Timestamp(v) => v.timestamp() == 0 && v.timestamp_subsec_nanos() == 0,
            Value::Uuid(v) => v.is_nil(),
            Value::NullUuid(v) => v.is_null(),
            Value::Ptr(_, v) => v.is_none(),
            Value::Slice(_, v) => v.is_empty(),
            Value::Opaque(v) => v.is_zero(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v.get()),
            Value::Uint(v) => write!(f, "{}", v.get()),
            Value::Float(Float::F32(v)) => write!(f, "{v}"),
            Value::Float(Float::F64(v)) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Timestamp(v) => f.write_str(&canonical::rfc3339_trimmed(v)),
            Value::Uuid(v) | Value::NullUuid(NullUuid(Some(v))) => {
                write!(f, "{}", v.hyphenated())
            }
            Value::NullUuid(NullUuid(None)) | Value::Ptr(_, None) => f.write_str("null"),
            Value::Ptr(_, Some(v)) => v.fmt(f),
            Value::Slice(_, values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    v.fmt(f)?;
                }
                f.write_str("]")
            }
            Value::Opaque(v) => write!(f, "{v:?}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(Int::I8(v)) => serializer.serialize_i8(*v),
            Value::Int(Int::I16(v)) => serializer.serialize_i16(*v),
            Value::Int(Int::I32(v)) => serializer.serialize_i32(*v),
            Value::Int(Int::I64(v)) => serializer.serialize_i64(*v),
            Value::Int(Int::Isize(v)) => serializer.serialize_i64(*v as i64),
            Value::Uint(Uint::U8(v)) => serializer.serialize_u8(*v),
            Value::Uint(Uint::U16(v)) => serializer.serialize_u16(*v),
            Value::Uint(Uint::U32(v)) => serializer.serialize_u32(*v),
            Value::Uint(Uint::U64(v)) => serializer.serialize_u64(*v),
            Value::Uint(Uint::Usize(v)) => serializer.serialize_u64(*v as u64),
            Value::Float(Float::F32(v)) => serializer.serialize_f32(*v),
            Value::Float(Float::F64(v)) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Timestamp(v) => {
                let text = v.canonical_text().map_err(S::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Value::Uuid(v) | Value::NullUuid(NullUuid(Some(v))) => {
                serializer.serialize_str(&v.hyphenated().to_string())
            }
            Value::NullUuid(NullUuid(None)) | Value::Ptr(_, None) => serializer.serialize_none(),
            Value::Ptr(_, Some(v)) => serializer.serialize_some(v.as_ref()),
            Value::Slice(_, values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Opaque(v) => v.to_json().map_err(S::Error::custom)?.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::I64.to_string(), "i64");
        let ptr = ValueType::ptr(ValueType::String);
        assert_eq!(ptr.to_string(), "Option<String>");
        assert_eq!(
            ValueType::slice(ValueType::ptr(ValueType::U8)).to_string(),
            "Vec<Option<u8>>"
        );
    }

    #[test]
    fn test_nil_pointer_keeps_element_type() {
        let nil = Value::nil(ValueType::I32);
        assert!(nil.is_nil());
        assert_eq!(nil.value_type(), ValueType::ptr(ValueType::I32));
    }

    #[test]
    fn test_is_zero() {
        assert!(0i64.to_value().is_zero());
        assert!(String::new().to_value().is_zero());
        assert!(false.to_value().is_zero());
        assert!(Value::nil(ValueType::Bool).is_zero());
        assert!(Vec::<u16>::new().to_value().is_zero());
        assert!(Uuid::nil().to_value().is_zero());
        assert!(NullUuid::default().to_value().is_zero());
        assert!(DateTime::<chrono::Utc>::default().to_value().is_zero());

        assert!(!7u8.to_value().is_zero());
        assert!(!"x".to_value().is_zero());
        assert!(!Some(0i32).to_value().is_zero());
        assert!(!vec![0u16].to_value().is_zero());
    }

    #[test]
    fn test_negative_zero_is_not_zero() {
        assert!(0.0f64.to_value().is_zero());
        assert!(0.0f32.to_value().is_zero());
        assert!(!(-0.0f64).to_value().is_zero());
        assert!(!(-0.0f32).to_value().is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(vec![1i32, 2, 3].to_value().to_string(), "[1, 2, 3]");
        assert_eq!(Some("a").to_value().to_string(), "a");
        assert_eq!(None::<i64>.to_value().to_string(), "null");
    }

    #[test]
    fn test_serialize_json() {
        let value = vec![Some(1i64), None].to_value();
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,null]");

        let ts = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.500+00:00").unwrap();
        assert_eq!(
            serde_json::to_string(&ts.to_value()).unwrap(),
            "\"2024-01-15T10:30:00.5Z\""
        );
    }
}
