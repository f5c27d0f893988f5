//! Patch inputs: the fields to write and the primary key of the row.

mod patch_set;
mod primary_key;

pub use patch_set::PatchSet;
pub use primary_key::{KeyPart, PrimaryKey};
