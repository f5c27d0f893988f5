//! Conversions from Rust field types into [`Value`].

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use super::{Float, Int, NullUuid, Uint, Value, ValueType};

/// Types that can be lowered into a [`Value`].
///
/// Every field of a row declared with [`row!`](macro@crate::row) must implement
/// this trait. Types outside the enumerated kinds can opt in through
/// [`opaque_value!`](crate::opaque_value).
pub trait ToValue {
    /// The runtime type produced by [`ToValue::to_value`].
    fn value_type() -> ValueType;

    /// Lowers `self` into a [`Value`].
    fn to_value(&self) -> Value;
}

macro_rules! impl_to_value {
    ($($ty:ty => $kind:ident :: $variant:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                #[inline]
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                #[inline]
                fn to_value(&self) -> Value {
                    Value::$kind($kind::$variant(*self))
                }
            }
        )*
    };
}

impl_to_value!(
    i8 => Int::I8,
    i16 => Int::I16,
    i32 => Int::I32,
    i64 => Int::I64,
    isize => Int::Isize,
    u8 => Uint::U8,
    u16 => Uint::U16,
    u32 => Uint::U32,
    u64 => Uint::U64,
    usize => Uint::Usize,
    f32 => Float::F32,
    f64 => Float::F64,
);

impl ToValue for bool {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for str {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::String
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::String
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToValue for DateTime<FixedOffset> {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::Timestamp
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl ToValue for DateTime<Utc> {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::Timestamp
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Timestamp((*self).into())
    }
}

impl ToValue for Uuid {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::Uuid
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl ToValue for NullUuid {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::NullUuid
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::NullUuid(*self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn value_type() -> ValueType {
        ValueType::ptr(T::value_type())
    }

    fn to_value(&self) -> Value {
        Value::Ptr(
            T::value_type(),
            self.as_ref().map(|v| Box::new(v.to_value())),
        )
    }
}

impl<T: ToValue> ToValue for [T] {
    fn value_type() -> ValueType {
        ValueType::slice(T::value_type())
    }

    fn to_value(&self) -> Value {
        let values = self.iter().map(ToValue::to_value).collect();
        Value::Slice(T::value_type(), values)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn value_type() -> ValueType {
        <[T]>::value_type()
    }

    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    #[inline]
    fn value_type() -> ValueType {
        T::value_type()
    }

    #[inline]
    fn to_value(&self) -> Value {
        T::to_value(self)
    }
}

/// Implements [`ToValue`] for types compared with their own `PartialEq`.
///
/// The types must be `Clone + Debug + Default + PartialEq + Serialize + Send +
/// Sync + 'static`.
///
/// ```
/// use row_patcher::{ToValue, Value, opaque_value};
///
/// #[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
/// struct Money {
///     cents: i64,
///     currency: String,
/// }
///
/// opaque_value!(Money);
///
/// let value = Money { cents: 5, currency: "EUR".into() }.to_value();
/// assert!(matches!(value, Value::Opaque(_)));
/// ```
#[macro_export]
macro_rules! opaque_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ToValue for $ty {
                fn value_type() -> $crate::ValueType {
                    $crate::ValueType::Opaque($crate::value::OpaqueType::of::<$ty>())
                }

                fn to_value(&self) -> $crate::Value {
                    $crate::Value::Opaque($crate::value::Opaque::new(
                        ::core::clone::Clone::clone(self),
                    ))
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_integer_widths_are_kept() {
        assert_eq!(5i32.to_value(), Value::Int(Int::I32(5)));
        assert_eq!(5i64.to_value(), Value::Int(Int::I64(5)));
        assert_eq!(5u8.to_value().value_type(), ValueType::U8);
    }

    #[test]
    fn test_option_is_pointer() {
        assert_eq!(
            Some(3u16).to_value(),
            Value::Ptr(ValueType::U16, Some(Box::new(Value::Uint(Uint::U16(3)))))
        );
        assert_eq!(None::<String>.to_value(), Value::nil(ValueType::String));
    }

    #[test]
    fn test_vec_of_pointers() {
        let value = vec![Some(true), None].to_value();
        let expected = ValueType::slice(ValueType::ptr(ValueType::Bool));
        assert_eq!(value.value_type(), expected);
    }

    #[test]
    fn test_utc_becomes_fixed_offset() {
        let ts = DateTime::<Utc>::default();
        assert_eq!(ts.to_value().value_type(), ValueType::Timestamp);
        assert_eq!(<&str>::value_type(), ValueType::String);
    }
}
