//! Write descriptions handed to the database client.
//!
//! The crate does not talk to a database itself. Writes are described as
//! [`Mutation`]s and passed to an implementation of [`Transaction`], which is
//! also asked to read back prior rows for audited updates and deletes.

use alloc::string::String;
use alloc::vec::Vec;

use crate::patch::{PatchSet, PrimaryKey};
use crate::row::Row;
use crate::value::Value;
use crate::{IndexMap, Params};

/// Column name to value, ready for an insert or update primitive.
pub type ColumnMap = IndexMap<String, Value>;

/// A buffered write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Inserts a new row.
    Insert {
        /// Target table.
        table: String,
        /// Column values of the row.
        values: ColumnMap,
    },
    /// Updates the columns present in `values`.
    Update {
        /// Target table.
        table: String,
        /// Column values, primary key columns included.
        values: ColumnMap,
    },
    /// Deletes the row addressed by `key`.
    Delete {
        /// Target table.
        table: String,
        /// Primary key of the row.
        key: PrimaryKey,
    },
}

impl Mutation {
    /// Target table of the mutation.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Mutation::Insert { table, .. }
            | Mutation::Update { table, .. }
            | Mutation::Delete { table, .. } => table,
        }
    }

    /// Lower-case name of the operation.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Mutation::Insert { .. } => "insert",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

/// An insert or update of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Target table.
    pub table: String,
    /// Primary key of the row.
    pub primary_key: PrimaryKey,
    /// Fields to write.
    pub patch_set: PatchSet,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(table: impl Into<String>, primary_key: PrimaryKey, patch_set: PatchSet) -> Self {
        Self {
            table: table.into(),
            primary_key,
            patch_set,
        }
    }
}

/// A delete of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteEvent {
    /// Target table.
    pub table: String,
    /// Primary key of the row.
    pub primary_key: PrimaryKey,
}

impl DeleteEvent {
    /// Creates a delete event.
    #[must_use]
    pub fn new(table: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            table: table.into(),
            primary_key,
        }
    }
}

/// A parameterized query.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Query text with `@name` placeholders.
    pub sql: String,
    /// Placeholder bindings.
    pub params: Params,
}

/// Read-write transaction of the database client.
pub trait Transaction {
    /// Error reported by the client.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Buffers mutations to be applied when the transaction commits.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the mutations cannot be buffered.
    fn buffer_write(&mut self, mutations: Vec<Mutation>) -> Result<(), Self::Error>;

    /// Reads the single row selected by `statement`.
    ///
    /// Returns `Ok(None)` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the query fails.
    fn read_row<R: Row>(&mut self, statement: &Statement) -> Result<Option<R>, Self::Error>;
}
