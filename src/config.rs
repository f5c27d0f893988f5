//! Deserializable patcher configuration.

use alloc::string::String;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::errors::Error;

/// Default name of the change-tracking table.
pub const DEFAULT_CHANGE_TABLE: &str = "DataChangeEvents";

fn default_change_table() -> String {
    String::from(DEFAULT_CHANGE_TABLE)
}

/// Settings of a [`Patcher`](crate::Patcher), fixed for its lifetime.
///
/// ```
/// use row_patcher::{Dialect, PatcherConfig};
///
/// let config = PatcherConfig::from_json(r#"{"dialect": "Postgres"}"#).unwrap();
/// assert_eq!(config.dialect, Dialect::Postgres);
/// assert_eq!(config.tag_key(), "db");
/// assert_eq!(config.change_table, "DataChangeEvents");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatcherConfig {
    /// Target dialect, `spanner` or `postgres`.
    #[serde(default)]
    pub dialect: Dialect,
    /// Column tag to read instead of the dialect's own.
    #[serde(default)]
    pub tag_key: Option<String>,
    /// Table receiving [`DataChangeEvent`](crate::DataChangeEvent)s.
    #[serde(default = "default_change_table")]
    pub change_table: String,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            tag_key: None,
            change_table: default_change_table(),
        }
    }
}

impl PatcherConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// * `Json` - If the text is not a valid configuration, including an
    ///   unsupported dialect name.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// The column tag the registry reads.
    #[must_use]
    pub fn tag_key(&self) -> &str {
        self.tag_key.as_deref().unwrap_or(self.dialect.tag_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_defaults() {
        let config = PatcherConfig::from_json("{}").unwrap();
        assert_eq!(config, PatcherConfig::default());
        assert_eq!(config.dialect, Dialect::Spanner);
        assert_eq!(config.tag_key(), "spanner");
    }

    #[test]
    fn test_overrides() {
        let config = PatcherConfig::from_json(
            r#"{"dialect": "spanner", "tag_key": "col", "change_table": "Audit"}"#,
        )
        .unwrap();
        assert_eq!(config.tag_key(), "col");
        assert_eq!(config.change_table, "Audit");
    }

    #[test]
    fn test_unsupported_dialect() {
        let err = PatcherConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().contains("unsupported dialect `oracle`"));
    }

    #[test]
    fn test_unknown_field() {
        let typo = PatcherConfig::from_json(r#"{"dialects": "spanner"}"#);
        assert!(typo.is_err());
    }
}
