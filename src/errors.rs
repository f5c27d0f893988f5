//! Submodule defining the errors used across the crate.

use alloc::boxed::Box;
use alloc::string::{String, ToString};

use crate::value::ValueType;

/// Errors that can occur while resolving, diffing and rendering patches.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row sample or snapshot is not a struct or a single pointer to a struct.
    #[error("expected a struct or a single pointer to a struct, found `{type_name}`")]
    InvalidRowType {
        /// Name of the offending type.
        type_name: &'static str,
    },
    /// A logical field has no registry entry for the row type.
    #[error("field `{field}` not found in struct")]
    FieldNotFound {
        /// The requested logical field.
        field: String,
    },
    /// A patch references a field the prior row does not have.
    #[error("field `{field}` in patch set does not exist in old row")]
    FieldNotInOld {
        /// The patch field.
        field: String,
    },
    /// A predicate was requested for a key set without parts.
    #[error("key set must contain at least one key part")]
    EmptyKeySet,
    /// A write map was requested without primary key parts.
    #[error("must include at least one primary key part")]
    EmptyPrimaryKey,
    /// The dialect name is not one this crate can render.
    #[error("unsupported dialect `{0}`")]
    UnsupportedDialect(String),
    /// Two values of different runtime types were compared.
    #[error("attempted to diff incomparable types, old: `{old}`, new: `{new}`")]
    Incomparable {
        /// Runtime type of the old value.
        old: String,
        /// Runtime type of the new value.
        new: String,
    },
    /// Canonical text of a temporal or identifier value could not be derived.
    #[error("canonical text serialization failed: {0}")]
    Serialization(String),
    /// Comparing a specific field failed.
    #[error("comparing field `{field}`: {source}")]
    Compare {
        /// The field being compared.
        field: String,
        /// The comparator failure.
        source: Box<Error>,
    },
    /// A write produced an empty change set.
    #[error("no changes to apply to `{table}`")]
    NoChanges {
        /// The table being written.
        table: String,
    },
    /// The prior row could not be read back.
    #[error("{table} `{row_id}` not found")]
    RowNotFound {
        /// The table that was queried.
        table: String,
        /// The row identifier built from the primary key.
        row_id: String,
    },
    /// Encoding the audit payload failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The database collaborator reported an error.
    #[error("transaction failed: {0}")]
    Transaction(#[source] Box<dyn core::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn field_not_found(field: &str) -> Self {
        Self::FieldNotFound {
            field: field.to_string(),
        }
    }

    pub(crate) fn incomparable(old: &ValueType, new: &ValueType) -> Self {
        Self::Incomparable {
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    pub(crate) fn transaction<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Transaction(Box::new(err))
    }
}
