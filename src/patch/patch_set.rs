//! Submodule defining the [`PatchSet`] container.

use alloc::string::String;

use crate::IndexMap;
use crate::value::{ToValue, Value};

/// Partial update of a row: logical field name to new value.
///
/// Fields keep their insertion order and are unique; setting a field twice
/// replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    data: IndexMap<String, Value>,
}

impl PatchSet {
    /// Creates an empty patch set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to `value`, builder style.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl ToValue) -> Self {
        self.insert(field, value.to_value());
        self
    }

    /// Sets `field` to an already lowered value.
    ///
    /// Returns the previous value of the field, if any.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(field.into(), value)
    }

    /// The value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Whether `field` is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    /// Field names in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// The underlying map.
    #[must_use]
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    /// Fields and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the patch set has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PatchSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut patch = Self::new();
        for (field, value) in iter {
            patch.insert(field, value);
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_insertion_order_and_replace() {
        let patch = PatchSet::new()
            .set("Name", "a")
            .set("Age", 3i64)
            .set("Name", "b");
        assert_eq!(patch.fields().collect::<Vec<_>>(), ["Name", "Age"]);
        assert_eq!(patch.get("Name"), Some(&"b".to_value()));
        assert_eq!(patch.len(), 2);
        assert!(patch.contains("Age"));
        assert!(!patch.contains("age"));
    }

    #[test]
    fn test_from_iter() {
        let patch: PatchSet = [("A", 1u8.to_value()), ("B", true.to_value())]
            .into_iter()
            .collect();
        let pairs: Vec<_> = patch.iter().map(|(f, v)| (f, v.clone())).collect();
        assert_eq!(pairs, [("A", 1u8.to_value()), ("B", true.to_value())]);
        assert!(PatchSet::default().is_empty());
    }
}
