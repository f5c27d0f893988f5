//! SQL dialects and identifier rendering.

use alloc::string::{String, ToString};
use core::fmt::{self, Display};
use core::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::errors::Error;

/// Target database dialect.
///
/// The dialect decides which column tag the registry reads and how column
/// identifiers are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Cloud Spanner: `spanner` tags, bare identifiers.
    #[default]
    Spanner,
    /// PostgreSQL: `db` tags, double-quoted identifiers.
    Postgres,
}

impl Dialect {
    /// Name of the column tag read for this dialect.
    #[must_use]
    pub const fn tag_key(self) -> &'static str {
        match self {
            Dialect::Spanner => "spanner",
            Dialect::Postgres => "db",
        }
    }

    /// Canonical lower-case name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Spanner => "spanner",
            Dialect::Postgres => "postgres",
        }
    }

    /// Appends `column` to `out` as an identifier of this dialect.
    pub fn push_identifier(self, out: &mut String, column: &str) {
        match self {
            Dialect::Spanner => out.push_str(column),
            Dialect::Postgres => push_quoted(out, column),
        }
    }

    /// Renders `column` as an identifier of this dialect.
    #[must_use]
    pub fn identifier(self, column: &str) -> String {
        let mut out = String::with_capacity(column.len() + 2);
        self.push_identifier(&mut out, column);
        out
    }

    /// Joins column identifiers with `", "`.
    #[must_use]
    pub fn join_columns<'a>(self, columns: impl IntoIterator<Item = &'a str>) -> String {
        let mut out = String::new();
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.push_identifier(&mut out, column);
        }
        out
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push_str("\"\"");
        } else {
            out.push(c);
        }
    }
    out.push('"');
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("spanner") {
            Ok(Dialect::Spanner)
        } else if s.eq_ignore_ascii_case("postgres") || s.eq_ignore_ascii_case("postgresql") {
            Ok(Dialect::Postgres)
        } else {
            Err(Error::UnsupportedDialect(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Spanner".parse::<Dialect>().unwrap(), Dialect::Spanner);
        assert_eq!("POSTGRES".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
    }

    #[test]
    fn test_unsupported() {
        let err = "mysql".parse::<Dialect>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDialect(_)));
        assert_eq!(err.to_string(), "unsupported dialect `mysql`");
    }

    #[test]
    fn test_join_columns() {
        assert_eq!(Dialect::Spanner.join_columns(["name", "age"]), "name, age");
        assert_eq!(
            Dialect::Postgres.join_columns(["name", "age"]),
            "\"name\", \"age\""
        );
        assert_eq!(Dialect::Postgres.join_columns([]), "");
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(Dialect::Postgres.identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::Spanner.identifier("Plain"), "Plain");
    }

    #[test]
    fn test_tag_keys_and_display() {
        assert_eq!(Dialect::Spanner.tag_key(), "spanner");
        assert_eq!(Dialect::Postgres.tag_key(), "db");
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
        assert_eq!(Dialect::default(), Dialect::Spanner);
    }
}
