//! Buffered writes, optionally paired with a change-tracking record.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use chrono::{DateTime, Utc};

use super::{Patcher, delete_snapshot, diff};
use crate::audit::{DataChangeEvent, DiffMap, encode_change_set};
use crate::errors::Error;
use crate::mutation::{DeleteEvent, Event, Mutation, Transaction};
use crate::patch::{PatchSet, PrimaryKey};
use crate::row::{Row, RowValue};

fn non_empty(table: &str, changes: &DiffMap) -> Result<String, Error> {
    if changes.is_empty() {
        return Err(Error::NoChanges {
            table: table.to_string(),
        });
    }
    encode_change_set(changes)
}

/// JSON change set of inserting `patch` as a new `R`.
///
/// # Errors
///
/// * `NoChanges` - If the patch only holds zero values.
/// * Those of [`diff`].
pub fn insert_change_set<R: Row + Default>(table: &str, patch: &PatchSet) -> Result<String, Error> {
    non_empty(table, &diff(&R::default(), patch)?)
}

/// JSON change set of applying `patch` to `old`.
///
/// # Errors
///
/// * `NoChanges` - If no field of the patch changes.
/// * Those of [`diff`].
pub fn update_change_set<R: RowValue + ?Sized>(
    table: &str,
    old: &R,
    patch: &PatchSet,
) -> Result<String, Error> {
    non_empty(table, &diff(old, patch)?)
}

/// JSON change set of deleting `old`.
///
/// # Errors
///
/// * `NoChanges` - If every field of the row is zero.
/// * Those of [`delete_snapshot`].
pub fn delete_change_set<R: RowValue + ?Sized>(table: &str, old: &R) -> Result<String, Error> {
    non_empty(table, &delete_snapshot(old)?)
}

impl Patcher {
    /// Buffers the insert of `event`.
    ///
    /// # Errors
    ///
    /// Those of [`Patcher::resolve`], or `Transaction` if buffering fails.
    pub fn buffer_insert<R: RowValue + ?Sized, T: Transaction>(
        &self,
        txn: &mut T,
        event: &Event,
    ) -> Result<(), Error> {
        let values = self.resolve::<R>(&event.primary_key, &event.patch_set)?;
        buffer(
            txn,
            vec![Mutation::Insert {
                table: event.table.clone(),
                values,
            }],
        )
    }

    /// Buffers the update of `event`.
    ///
    /// # Errors
    ///
    /// Those of [`Patcher::resolve`], or `Transaction` if buffering fails.
    pub fn buffer_update<R: RowValue + ?Sized, T: Transaction>(
        &self,
        txn: &mut T,
        event: &Event,
    ) -> Result<(), Error> {
        let values = self.resolve::<R>(&event.primary_key, &event.patch_set)?;
        buffer(
            txn,
            vec![Mutation::Update {
                table: event.table.clone(),
                values,
            }],
        )
    }

    /// Buffers the delete of `event`.
    ///
    /// # Errors
    ///
    /// * `EmptyPrimaryKey` - If the key has no parts.
    /// * `Transaction` - If buffering fails.
    pub fn buffer_delete<T: Transaction>(
        &self,
        txn: &mut T,
        event: &DeleteEvent,
    ) -> Result<(), Error> {
        if event.primary_key.is_empty() {
            return Err(Error::EmptyPrimaryKey);
        }
        buffer(
            txn,
            vec![Mutation::Delete {
                table: event.table.clone(),
                key: event.primary_key.clone(),
            }],
        )
    }

    /// Buffers the insert of `event` together with its change record.
    ///
    /// The change set is the diff of `R::default()` against the patch.
    ///
    /// # Errors
    ///
    /// Those of [`Patcher::resolve`] and [`insert_change_set`], or
    /// `Transaction` if buffering fails.
    pub fn buffer_insert_with_change_event<R: Row + Default, T: Transaction>(
        &self,
        txn: &mut T,
        event_source: &str,
        event_time: DateTime<Utc>,
        event: &Event,
    ) -> Result<(), Error> {
        let values = self.resolve::<R>(&event.primary_key, &event.patch_set)?;
        let change_set = insert_change_set::<R>(&event.table, &event.patch_set)?;
        let record = self.change_record(
            &event.table,
            &event.primary_key,
            event_source,
            event_time,
            change_set,
        );
        buffer(
            txn,
            vec![
                Mutation::Insert {
                    table: event.table.clone(),
                    values,
                },
                record,
            ],
        )
    }

    /// Buffers the update of `event` together with its change record.
    ///
    /// The prior values of the patched columns are read back through `txn`
    /// and diffed against the patch.
    ///
    /// # Errors
    ///
    /// * `NoChanges` - If the patch is empty. Nothing is read or buffered.
    /// * `RowNotFound` - If the row does not exist.
    /// * Those of [`Patcher::resolve`] and [`update_change_set`], or
    ///   `Transaction` if reading or buffering fails.
    pub fn buffer_update_with_change_event<R: Row, T: Transaction>(
        &self,
        txn: &mut T,
        event_source: &str,
        event_time: DateTime<Utc>,
        event: &Event,
    ) -> Result<(), Error> {
        if event.patch_set.is_empty() {
            return Err(Error::NoChanges {
                table: event.table.clone(),
            });
        }
        let values = self.resolve::<R>(&event.primary_key, &event.patch_set)?;
        let columns = self.patch_set_columns::<R>(&event.patch_set)?;
        let old: R = self.read_prior(txn, &event.table, &columns, &event.primary_key)?;
        let change_set = update_change_set(&event.table, &old, &event.patch_set)?;
        let record = self.change_record(
            &event.table,
            &event.primary_key,
            event_source,
            event_time,
            change_set,
        );
        buffer(
            txn,
            vec![
                Mutation::Update {
                    table: event.table.clone(),
                    values,
                },
                record,
            ],
        )
    }

    /// Buffers the delete of `event` together with its change record.
    ///
    /// The change set holds every non-zero field of the row read back
    /// through `txn`.
    ///
    /// # Errors
    ///
    /// * `RowNotFound` - If the row does not exist.
    /// * Those of [`Patcher::where_clause`] and [`delete_change_set`], or
    ///   `Transaction` if reading or buffering fails.
    pub fn buffer_delete_with_change_event<R: Row, T: Transaction>(
        &self,
        txn: &mut T,
        event_source: &str,
        event_time: DateTime<Utc>,
        event: &DeleteEvent,
    ) -> Result<(), Error> {
        let columns = self.all_columns::<R>()?;
        let old: R = self.read_prior(txn, &event.table, &columns, &event.primary_key)?;
        let change_set = delete_change_set(&event.table, &old)?;
        let record = self.change_record(
            &event.table,
            &event.primary_key,
            event_source,
            event_time,
            change_set,
        );
        buffer(
            txn,
            vec![
                Mutation::Delete {
                    table: event.table.clone(),
                    key: event.primary_key.clone(),
                },
                record,
            ],
        )
    }

    fn read_prior<R: Row, T: Transaction>(
        &self,
        txn: &mut T,
        table: &str,
        columns: &str,
        key: &PrimaryKey,
    ) -> Result<R, Error> {
        let statement = self.select::<R>(table, columns, key)?;
        txn.read_row::<R>(&statement)
            .map_err(Error::transaction)?
            .ok_or_else(|| Error::RowNotFound {
                table: table.to_string(),
                row_id: key.row_id(),
            })
    }

    fn change_record(
        &self,
        table: &str,
        key: &PrimaryKey,
        event_source: &str,
        event_time: DateTime<Utc>,
        change_set: String,
    ) -> Mutation {
        let event = DataChangeEvent {
            table_name: table.to_string(),
            row_id: key.row_id(),
            event_time,
            event_source: event_source.to_string(),
            change_set,
        };
        Mutation::Insert {
            table: self.change_table.clone(),
            values: event.to_column_map(),
        }
    }
}

fn buffer<T: Transaction>(txn: &mut T, mutations: Vec<Mutation>) -> Result<(), Error> {
    tracing::debug!(
        table = mutations.first().map(Mutation::table),
        operation = mutations.first().map(Mutation::operation),
        mutations = mutations.len(),
        "buffering mutations"
    );
    txn.buffer_write(mutations).map_err(Error::transaction)
}
