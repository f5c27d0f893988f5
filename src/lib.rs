#![doc = include_str!("../README.md")]
#![deny(clippy::mod_module_files)]

extern crate alloc;

pub mod audit;
pub mod compare;
pub mod config;
pub mod dialect;
pub mod errors;
pub mod mutation;
pub mod patch;
pub mod patcher;
pub mod registry;
pub mod row;
pub mod value;

/// Insertion-ordered map used for column maps, params and diffs.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, hashbrown::DefaultHashBuilder>;

/// Placeholder name to bound value, in clause order.
pub type Params = IndexMap<alloc::string::String, Value>;

pub use audit::{DataChangeEvent, DiffElem, DiffMap};
pub use config::PatcherConfig;
pub use dialect::Dialect;
pub use errors::Error;
pub use mutation::{ColumnMap, DeleteEvent, Event, Mutation, Statement, Transaction};
pub use patch::{KeyPart, PatchSet, PrimaryKey};
pub use patcher::{
    Patcher, delete_change_set, delete_snapshot, diff, insert_change_set, update_change_set,
};
pub use registry::{ColumnEntry, FieldMap, Registry};
pub use row::{Row, RowValue};
pub use value::{NullUuid, ToValue, Value, ValueType};
