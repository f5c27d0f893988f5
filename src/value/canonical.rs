//! Canonical textual forms of temporal and identifier values.
//!
//! Timestamps admit several internal representations of the same instant text
//! (offset kept, nanoseconds padded or not). Equality of these values is
//! defined on their canonical text, which never carries trailing fraction
//! zeros.

use alloc::format;
use alloc::string::{String, ToString};

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;

/// Values with a canonical textual serialization.
pub trait CanonicalText {
    /// Returns the canonical text of the value.
    ///
    /// # Errors
    ///
    /// * `Serialization` - If the value has no canonical text.
    fn canonical_text(&self) -> Result<String, Error>;
}

impl CanonicalText for DateTime<FixedOffset> {
    /// RFC 3339 with `Z` for zero offsets and the fraction trimmed of
    /// trailing zeros.
    fn canonical_text(&self) -> Result<String, Error> {
        let year = self.year();
        if !(0..=9999).contains(&year) {
            return Err(Error::Serialization(format!(
                "timestamp year {year} outside of range [0,9999]"
            )));
        }
        Ok(rfc3339_trimmed(self))
    }
}

/// RFC 3339 text of `ts` with trailing fraction zeros removed.
pub(crate) fn rfc3339_trimmed(ts: &DateTime<FixedOffset>) -> String {
    let text = ts.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let Some((head, rest)) = text.split_once('.') else {
        return text;
    };
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (fraction, offset) = rest.split_at(digits);
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::with_capacity(text.len());
    out.push_str(head);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out.push_str(offset);
    out
}

impl CanonicalText for Uuid {
    fn canonical_text(&self) -> Result<String, Error> {
        Ok(self.hyphenated().to_string())
    }
}

/// A UUID that may be null.
///
/// Unlike `Option<Uuid>`, which is a nullable pointer to a UUID, this is a
/// single identifier value whose null state has the empty string as canonical
/// text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NullUuid(pub Option<Uuid>);

impl NullUuid {
    /// The null identifier.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Whether the identifier is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Uuid> for NullUuid {
    fn from(uuid: Uuid) -> Self {
        Self(Some(uuid))
    }
}

impl CanonicalText for NullUuid {
    fn canonical_text(&self) -> Result<String, Error> {
        match &self.0 {
            Some(uuid) => uuid.canonical_text(),
            None => Ok(String::new()),
        }
    }
}
