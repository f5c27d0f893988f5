//! Values outside the enumerated kinds.
//!
//! An [`Opaque`] is compared structurally, with the wrapped type's own
//! `PartialEq`, and only against values of the very same type.

use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt::{self, Debug};
use core::hash::{Hash, Hasher};

use serde::Serialize;

/// Object-safe capabilities an opaque value needs.
///
/// Implemented for every `Debug + Default + PartialEq + Serialize` type.
pub trait OpaqueValue: Any + Debug + Send + Sync {
    /// Upcast to `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Structural equality against a value of possibly another type.
    fn eq_any(&self, other: &dyn Any) -> bool;

    /// Whether the value equals its type's default.
    fn is_default(&self) -> bool;

    /// JSON rendering, used for audit payloads.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the value cannot be represented.
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T> OpaqueValue for T
where
    T: Any + Debug + Default + PartialEq + Serialize + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn is_default(&self) -> bool {
        *self == T::default()
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Shared handle to an opaque value.
#[derive(Clone)]
pub struct Opaque(Arc<dyn OpaqueValue>);

impl Opaque {
    /// Wraps `value`.
    #[must_use]
    pub fn new<T: OpaqueValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Runtime type of the wrapped value.
    #[must_use]
    pub fn opaque_type(&self) -> OpaqueType {
        OpaqueType {
            id: Any::type_id(self.0.as_any()),
            name: self.0.type_name(),
        }
    }

    /// Returns the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub(crate) fn structural_eq(&self, other: &Opaque) -> bool {
        self.0.eq_any(other.0.as_any())
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.0.is_default()
    }

    pub(crate) fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.0.to_json()
    }
}

impl Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

/// Runtime type of an [`Opaque`] value.
#[derive(Debug, Clone, Copy)]
pub struct OpaqueType {
    id: TypeId,
    name: &'static str,
}

impl OpaqueType {
    /// The opaque type of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Name of the concrete type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for OpaqueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpaqueType {}

impl Hash for OpaqueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct Other(i32);

    #[test]
    fn test_structural_equality() {
        let a = Opaque::new(Point { x: 1, y: 2 });
        let b = Opaque::new(Point { x: 1, y: 2 });
        let c = Opaque::new(Point { x: 2, y: 2 });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_different_types_never_equal() {
        let a = Opaque::new(Other(1));
        let b = Opaque::new(Point { x: 1, y: 0 });
        assert_ne!(a.opaque_type(), b.opaque_type());
        assert_ne!(a, b);
    }

    #[test]
    fn test_type_and_zero() {
        let a = Opaque::new(Point::default());
        assert_eq!(a.opaque_type(), OpaqueType::of::<Point>());
        assert!(a.is_zero());
        assert_eq!(a.downcast_ref::<Point>(), Some(&Point::default()));
        assert_eq!(a.to_json().unwrap(), serde_json::json!({"x": 0, "y": 0}));
    }
}
