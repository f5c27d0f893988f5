//! Column registry: logical field name to physical column, per row type.
//!
//! Row shapes are static for the life of the process, so each descriptor is
//! built once, on first use, and then shared. The cache sits behind a
//! read/write lock: lookups take the shared lock, and a miss takes the
//! exclusive lock, checks again for a concurrent build, then builds and
//! publishes. Descriptors are handed out as [`Arc`]s so that no lock is held
//! while callers use them.

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::any::TypeId;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::IndexMap;
use crate::errors::Error;
use crate::row::{RowDef, RowValue};

/// Registry entry of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnEntry {
    index: usize,
    column: &'static str,
}

impl ColumnEntry {
    /// Declaration index of the field within its struct.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Physical column name.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.column
    }
}

/// Field to column mapping of one row type.
///
/// Iteration follows declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    type_name: &'static str,
    entries: IndexMap<&'static str, ColumnEntry>,
}

impl FieldMap {
    /// Builds the mapping of `def` for the tag key `tag_key`.
    ///
    /// Fields without the tag, with an empty column name, or with the `-`
    /// sentinel are left out.
    #[must_use]
    pub fn build(def: &RowDef, tag_key: &str) -> Self {
        let mut entries = IndexMap::default();
        for (index, field) in def.fields.iter().enumerate() {
            let Some(tag) = field.tag(tag_key) else {
                continue;
            };
            let column = tag.split(',').next().unwrap_or_default();
            if column.is_empty() || column == "-" {
                continue;
            }
            entries.insert(field.name, ColumnEntry { index, column });
        }
        Self {
            type_name: def.type_name,
            entries,
        }
    }

    /// Name of the row type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The entry of `field`, if registered.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ColumnEntry> {
        self.entries.get(field)
    }

    /// The entry of `field`.
    ///
    /// # Errors
    ///
    /// * `FieldNotFound` - If the field has no column.
    pub fn entry(&self, field: &str) -> Result<&ColumnEntry, Error> {
        self.get(field).ok_or_else(|| Error::field_not_found(field))
    }

    /// Whether `field` has a column.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Registered fields and their entries, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ColumnEntry)> {
        self.entries.iter().map(|(field, entry)| (*field, entry))
    }

    /// Number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lazily populated, per-type cache of [`FieldMap`]s for one tag key.
#[derive(Debug)]
pub struct Registry {
    tag_key: Cow<'static, str>,
    cache: RwLock<HashMap<TypeId, Arc<FieldMap>>>,
}

impl Registry {
    /// Creates an empty registry reading the `tag_key` column tags.
    #[must_use]
    pub fn new(tag_key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag_key: tag_key.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The tag key the registry reads.
    #[must_use]
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Number of row types resolved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether no row type has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Resolves the field map of `R`, building it on first use.
    ///
    /// # Errors
    ///
    /// * `InvalidRowType` - If `R` is not a struct or a single pointer to one.
    pub fn resolve<R: RowValue + ?Sized>(&self) -> Result<Arc<FieldMap>, Error> {
        let shape = R::shape();
        let def = shape.row_def().ok_or(Error::InvalidRowType {
            type_name: shape.type_name(),
        })?;

        if let Some(map) = self.cache.read().get(&def.type_id) {
            return Ok(Arc::clone(map));
        }

        let mut cache = self.cache.write();
        if let Some(map) = cache.get(&def.type_id) {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(FieldMap::build(&def, &self.tag_key));
        tracing::debug!(
            row_type = def.type_name,
            tag_key = %self.tag_key,
            columns = map.len(),
            "built column registry entry"
        );
        cache.insert(def.type_id, Arc::clone(&map));
        Ok(map)
    }

    /// Resolves the field map of the type of `sample`.
    ///
    /// # Errors
    ///
    /// * `InvalidRowType` - If the sample is not a struct or a single pointer to one.
    pub fn resolve_for<R: RowValue>(&self, _sample: &R) -> Result<Arc<FieldMap>, Error> {
        self.resolve::<R>()
    }
}
