//! Row types and their field declarations.
//!
//! Rust has no runtime reflection, so a row type describes its fields
//! statically through [`Row`]. The [`row!`](macro@crate::row) macro declares a struct
//! and implements the traits in one go:
//!
//! ```
//! use row_patcher::row;
//!
//! row! {
//!     /// A user account.
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct User {
//!         #[column(spanner = "Id", db = "id")]
//!         pub id: i64,
//!         #[column(spanner = "Name", db = "name,omitempty")]
//!         pub name: String,
//!         /// Never persisted.
//!         #[column(spanner = "-", db = "-")]
//!         pub cached: bool,
//!         pub note: Option<String>,
//!     }
//! }
//! ```
//!
//! Each `#[column(...)]` entry maps a tag key to a tag string; the registry
//! configured for that key takes the text before the first comma as the column
//! name. Doc comments go before the `#[column]` attribute.
//!
//! [`RowValue`] widens the accepted inputs to what a row sample may be at
//! runtime: the struct itself or one level of pointer (`&T`, `Box<T>`,
//! `Rc<T>`, `Arc<T>`). Anything else reports its type as not a row.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::value::{NullUuid, Value};

/// Static declaration of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Logical field name.
    pub name: &'static str,
    /// `(tag key, tag string)` pairs.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldDef {
    /// The tag string registered for `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find_map(|&(k, tag)| (k == key).then_some(tag))
    }
}

/// Struct types usable as database rows.
///
/// Implemented by [`row!`](macro@crate::row).
pub trait Row: RowValue + 'static {
    /// Fields in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Current value of every field, in declaration order.
    fn field_values(&self) -> Vec<(&'static str, Value)>;
}

/// What a runtime row sample turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// A struct, possibly behind one pointer.
    Struct(RowDef),
    /// Anything else.
    Other {
        /// Name of the rejected type.
        type_name: &'static str,
    },
}

/// A struct row type after pointer dereference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowDef {
    /// Identity of the struct type, the registry cache key.
    pub type_id: TypeId,
    /// Name of the struct type.
    pub type_name: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [FieldDef],
    indirect: bool,
}

impl RowShape {
    /// The shape of a [`Row`] struct.
    #[must_use]
    pub fn of_row<R: Row>() -> Self {
        RowShape::Struct(RowDef {
            type_id: TypeId::of::<R>(),
            type_name: core::any::type_name::<R>(),
            fields: R::FIELDS,
            indirect: false,
        })
    }

    /// The shape of a non-row type.
    #[must_use]
    pub fn other<T: ?Sized>() -> Self {
        RowShape::Other {
            type_name: core::any::type_name::<T>(),
        }
    }

    /// The shape seen through a pointer `P` to this shape.
    ///
    /// Only one level of indirection is accepted.
    #[must_use]
    pub fn through_pointer<P: ?Sized>(self) -> Self {
        match self {
            RowShape::Struct(def) if !def.indirect => RowShape::Struct(RowDef {
                indirect: true,
                ..def
            }),
            _ => RowShape::other::<P>(),
        }
    }

    /// The struct definition, if this is a row.
    #[must_use]
    pub const fn row_def(self) -> Option<RowDef> {
        match self {
            RowShape::Struct(def) => Some(def),
            RowShape::Other { .. } => None,
        }
    }

    /// Name of the sampled type.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            RowShape::Struct(def) => def.type_name,
            RowShape::Other { type_name } => type_name,
        }
    }
}

/// Any value that may be offered as a row sample or snapshot.
pub trait RowValue {
    /// The static shape of the type.
    fn shape() -> RowShape;

    /// Snapshot of every field, or `None` if the type is not a row.
    fn row_fields(&self) -> Option<Vec<(&'static str, Value)>>;
}

macro_rules! impl_pointer_row_value {
    ($($ptr:ident),* $(,)?) => {
        $(
            impl<T: RowValue> RowValue for $ptr<T> {
                fn shape() -> RowShape {
                    T::shape().through_pointer::<Self>()
                }

                fn row_fields(&self) -> Option<Vec<(&'static str, Value)>> {
                    match Self::shape() {
                        RowShape::Struct(_) => T::row_fields(self),
                        RowShape::Other { .. } => None,
                    }
                }
            }
        )*
    };
}

impl_pointer_row_value!(Box, Rc, Arc);

impl<T: RowValue> RowValue for &T {
    fn shape() -> RowShape {
        T::shape().through_pointer::<Self>()
    }

    fn row_fields(&self) -> Option<Vec<(&'static str, Value)>> {
        match Self::shape() {
            RowShape::Struct(_) => T::row_fields(self),
            RowShape::Other { .. } => None,
        }
    }
}

macro_rules! impl_non_row_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RowValue for $ty {
                fn shape() -> RowShape {
                    RowShape::other::<Self>()
                }

                fn row_fields(&self) -> Option<Vec<(&'static str, Value)>> {
                    None
                }
            }
        )*
    };
}

impl_non_row_value!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, Uuid, NullUuid,
    DateTime<Utc>, DateTime<FixedOffset>,
);

impl<T> RowValue for Option<T> {
    fn shape() -> RowShape {
        RowShape::other::<Self>()
    }

    fn row_fields(&self) -> Option<Vec<(&'static str, Value)>> {
        None
    }
}

impl<T> RowValue for Vec<T> {
    fn shape() -> RowShape {
        RowShape::other::<Self>()
    }

    fn row_fields(&self) -> Option<Vec<(&'static str, Value)>> {
        None
    }
}

/// Declares a row struct and implements [`Row`] and [`RowValue`] for it.
///
/// See the [module documentation](mod@crate::row) for the syntax. Every field type
/// must implement [`ToValue`](crate::ToValue).
#[macro_export]
macro_rules! row {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[column($($key:ident = $tag:literal),* $(,)?)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::row::Row for $name {
            const FIELDS: &'static [$crate::row::FieldDef] = &[
                $(
                    $crate::row::FieldDef {
                        name: ::core::stringify!($field),
                        tags: &[$($((::core::stringify!($key), $tag)),*)?],
                    },
                )*
            ];

            fn field_values(&self) -> ::std::vec::Vec<(&'static str, $crate::Value)> {
                ::std::vec![
                    $(
                        (
                            ::core::stringify!($field),
                            $crate::ToValue::to_value(&self.$field),
                        ),
                    )*
                ]
            }
        }

        impl $crate::row::RowValue for $name {
            fn shape() -> $crate::row::RowShape {
                $crate::row::RowShape::of_row::<Self>()
            }

            fn row_fields(
                &self,
            ) -> ::core::option::Option<::std::vec::Vec<(&'static str, $crate::Value)>> {
                ::core::option::Option::Some($crate::row::Row::field_values(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    crate::row! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Account {
            #[column(spanner = "Id", db = "id")]
            id: i64,
            /// Display name.
            #[column(spanner = "Name")]
            name: String,
            note: Option<String>,
        }
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let names: Vec<_> = Account::FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "name", "note"]);
        assert_eq!(Account::FIELDS[0].tag("db"), Some("id"));
        assert_eq!(Account::FIELDS[1].tag("db"), None);
        assert_eq!(Account::FIELDS[1].tag("spanner"), Some("Name"));
        assert!(Account::FIELDS[2].tags.is_empty());
    }

    #[test]
    fn test_single_pointer_is_row() {
        let def = <Box<Account>>::shape().row_def().unwrap();
        assert_eq!(def.type_id, TypeId::of::<Account>());
        assert!(<&Account>::shape().row_def().is_some());
        assert!(<Arc<Account>>::shape().row_def().is_some());
    }

    #[test]
    fn test_double_pointer_and_scalars_are_not_rows() {
        assert!(<Box<Box<Account>>>::shape().row_def().is_none());
        assert!(<&Rc<Account>>::shape().row_def().is_none());
        assert!(i64::shape().row_def().is_none());
        assert!(<Option<Account>>::shape().row_def().is_none());
        let nested = Box::new(Box::new(Account::default()));
        assert!(nested.row_fields().is_none());
    }

    #[test]
    fn test_field_values() {
        let account = Account {
            id: 7,
            name: "a".into(),
            note: None,
        };
        let values = Box::new(account).row_fields().unwrap();
        assert_eq!(values[0], ("id", crate::ToValue::to_value(&7i64)));
        assert_eq!(values[2].1, Value::nil(crate::ValueType::String));
    }
}
