//! Value comparison for diffs.
//!
//! Generic structural equality is not what a diff wants for every kind:
//! two timestamps that render to the same canonical text are the same value
//! for the database, and nullable pointers need `None == None`. [`equal`]
//! therefore dispatches on the old value's kind:
//!
//! | Kind | Rule |
//! |------|------|
//! | numbers, strings, booleans | by value, widths must match |
//! | timestamps, UUIDs, nullable UUIDs | by canonical text |
//! | `Option<T>` | both `None` equal, one `None` unequal, else compare pointees |
//! | `Vec<T>` | equal length and pairwise equal elements |
//! | opaque | the type's own `PartialEq`, types must match |
//!
//! Any type mismatch yields [`Error::Incomparable`].

use crate::errors::Error;
use crate::value::{CanonicalText, Value};

/// Compares the old and new value of a field.
///
/// Returns `Ok(true)` when the values are equal and `Ok(false)` when they
/// differ.
///
/// # Errors
///
/// * `Incomparable` - If the runtime types of `old` and `new` differ.
/// * `Serialization` - If a timestamp has no canonical text.
pub fn equal(old: &Value, new: &Value) -> Result<bool, Error> {
    match (old, new) {
        (Value::Int(a), Value::Int(b)) if a.value_type() == b.value_type() => Ok(a == b),
        (Value::Uint(a), Value::Uint(b)) if a.value_type() == b.value_type() => Ok(a == b),
        (Value::Float(a), Value::Float(b)) if a.value_type() == b.value_type() => Ok(a == b),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Timestamp(a), Value::Timestamp(b)) => match_canonical(a, b),
        (Value::Uuid(a), Value::Uuid(b)) => match_canonical(a, b),
        (Value::NullUuid(a), Value::NullUuid(b)) => match_canonical(a, b),
        (Value::Ptr(a_ty, a), Value::Ptr(b_ty, b)) if a_ty == b_ty => {
            match_pointer(a.as_deref(), b.as_deref())
        }
        (Value::Slice(a_ty, a), Value::Slice(b_ty, b)) if a_ty == b_ty => match_slice(a, b),
        (Value::Opaque(a), Value::Opaque(b)) if a.opaque_type() == b.opaque_type() => {
            Ok(a.structural_eq(b))
        }
        _ => Err(Error::incomparable(&old.value_type(), &new.value_type())),
    }
}

fn match_pointer(old: Option<&Value>, new: Option<&Value>) -> Result<bool, Error> {
    match (old, new) {
        (None, None) => Ok(true),
        (Some(old), Some(new)) => equal(old, new),
        _ => Ok(false),
    }
}

fn match_slice(old: &[Value], new: &[Value]) -> Result<bool, Error> {
    if old.len() != new.len() {
        return Ok(false);
    }
    for (old, new) in old.iter().zip(new) {
        if !equal(old, new)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn match_canonical<T: CanonicalText>(old: &T, new: &T) -> Result<bool, Error> {
    Ok(old.canonical_text()? == new.canonical_text()?)
}
