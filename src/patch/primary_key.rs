//! Submodule defining single and composite primary keys.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::value::{ToValue, Value};

/// One field of a primary key and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPart {
    field: String,
    value: Value,
}

impl KeyPart {
    /// Creates a key part.
    #[must_use]
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// Logical field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Key value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A single or composite primary key with its values.
///
/// Parts keep the order in which they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKey {
    parts: Vec<KeyPart>,
}

impl PrimaryKey {
    /// A key with a single part.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl ToValue) -> Self {
        Self {
            parts: alloc::vec![KeyPart::new(field, value.to_value())],
        }
    }

    /// Returns the key extended with another part, making it composite.
    #[must_use]
    pub fn add(mut self, field: impl Into<String>, value: impl ToValue) -> Self {
        self.parts.push(KeyPart::new(field, value.to_value()));
        self
    }

    /// The parts in order.
    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// The values in order, as needed to address the row in a delete.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.parts.iter().map(KeyPart::value)
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the key has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Row identifier for audit records: the part values joined with `|`.
    ///
    /// An empty key yields the empty string.
    #[must_use]
    pub fn row_id(&self) -> String {
        let mut id = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                id.push('|');
            }
            id.push_str(&part.value.to_string());
        }
        id
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PrimaryKey {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            parts: iter
                .into_iter()
                .map(|(field, value)| KeyPart::new(field, value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_composite_key() {
        let key = PrimaryKey::new("Id", 7i64).add("Region", "eu");
        assert_eq!(key.len(), 2);
        assert_eq!(key.parts()[1].field(), "Region");
        assert_eq!(key.row_id(), "7|eu");
    }

    #[test]
    fn test_row_id_formats() {
        let id = Uuid::from_u128(1);
        let row_id = PrimaryKey::new("Id", id).row_id();
        assert_eq!(row_id, "00000000-0000-0000-0000-000000000001");
        assert_eq!(PrimaryKey::default().row_id(), "");
        assert!(PrimaryKey::default().is_empty());
    }

    #[test]
    fn test_add_leaves_original() {
        let base = PrimaryKey::new("A", 1u32);
        let extended = base.clone().add("B", 2u32);
        assert_eq!(base.len(), 1);
        let values: Vec<_> = extended.values().cloned().collect();
        assert_eq!(values, [1u32.to_value(), 2u32.to_value()]);
    }

    #[test]
    fn test_from_iter() {
        let key: PrimaryKey = [("A", "x".to_value())].into_iter().collect();
        assert_eq!(key, PrimaryKey::new("A", "x"));
    }
}
