//! Patch resolution: column lists, key predicates, write maps and diffs.
//!
//! A [`Patcher`] ties a [`Dialect`] to its own [`Registry`], so patchers with
//! different tag keys coexist in one process without sharing cache entries.
//! [`diff`] and [`delete_snapshot`] only look at row values and need no
//! patcher.

mod changes;

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

pub use changes::{delete_change_set, insert_change_set, update_change_set};

use crate::audit::{DiffElem, DiffMap};
use crate::compare;
use crate::config::{DEFAULT_CHANGE_TABLE, PatcherConfig};
use crate::dialect::Dialect;
use crate::errors::Error;
use crate::mutation::{ColumnMap, Statement};
use crate::patch::{PatchSet, PrimaryKey};
use crate::registry::{ColumnEntry, FieldMap, Registry};
use crate::row::{Row, RowValue};
use crate::value::Value;
use crate::{IndexMap, Params};

/// Resolves patches against row types for one dialect.
#[derive(Debug)]
pub struct Patcher {
    dialect: Dialect,
    change_table: String,
    registry: Registry,
}

impl Patcher {
    /// A patcher for `dialect`, reading the dialect's own column tag.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self::with_tag_key(dialect, dialect.tag_key())
    }

    /// A patcher for `dialect` reading the `tag_key` column tag.
    #[must_use]
    pub fn with_tag_key(dialect: Dialect, tag_key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            dialect,
            change_table: String::from(DEFAULT_CHANGE_TABLE),
            registry: Registry::new(tag_key),
        }
    }

    /// A Spanner patcher reading `spanner` tags.
    #[must_use]
    pub fn spanner() -> Self {
        Self::new(Dialect::Spanner)
    }

    /// A PostgreSQL patcher reading `db` tags.
    #[must_use]
    pub fn postgres() -> Self {
        Self::new(Dialect::Postgres)
    }

    /// A patcher built from `config`.
    #[must_use]
    pub fn from_config(config: &PatcherConfig) -> Self {
        Self::with_tag_key(config.dialect, config.tag_key().to_string())
            .with_change_table(config.change_table.clone())
    }

    /// Sets the table receiving change events.
    #[must_use]
    pub fn with_change_table(mut self, table: impl Into<String>) -> Self {
        self.change_table = table.into();
        self
    }

    /// The dialect columns and predicates are rendered in.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The table receiving change events.
    #[must_use]
    pub fn change_table(&self) -> &str {
        &self.change_table
    }

    /// The column registry of this patcher.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    fn field_map<R: RowValue + ?Sized>(&self) -> Result<Arc<FieldMap>, Error> {
        self.registry.resolve::<R>()
    }

    /// Renders the columns of `fields` in declaration order.
    ///
    /// The order of `fields` does not matter.
    ///
    /// # Errors
    ///
    /// * `InvalidRowType` - If `R` is not a row.
    /// * `FieldNotFound` - If a field has no column.
    pub fn columns<R, I, S>(&self, fields: I) -> Result<String, Error>
    where
        R: RowValue + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map = self.field_map::<R>()?;
        let mut entries = fields
            .into_iter()
            .map(|field| map.entry(field.as_ref()).copied())
            .collect::<Result<Vec<ColumnEntry>, Error>>()?;
        entries.sort_by_key(ColumnEntry::index);
        Ok(self
            .dialect
            .join_columns(entries.iter().map(ColumnEntry::column)))
    }

    /// Renders the columns of the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// * `InvalidRowType` - If `R` is not a row.
    /// * `FieldNotFound` - If a patch field has no column.
    pub fn patch_set_columns<R: RowValue + ?Sized>(
        &self,
        patch: &PatchSet,
    ) -> Result<String, Error> {
        self.columns::<R, _, _>(patch.fields())
    }

    /// Renders every column of `R`.
    ///
    /// # Errors
    ///
    /// * `InvalidRowType` - If `R` is not a row.
    pub fn all_columns<R: RowValue + ?Sized>(&self) -> Result<String, Error> {
        let map = self.field_map::<R>()?;
        Ok(self
            .dialect
            .join_columns(map.iter().map(|(_, entry)| entry.column())))
    }

    /// Renders the predicate selecting the row of `key`.
    ///
    /// Each part becomes `<column> = @<lower-case column>` and parts are
    /// joined with `AND`. The returned params bind every placeholder.
    ///
    /// # Errors
    ///
    /// * `EmptyKeySet` - If `key` has no parts.
    /// * `InvalidRowType` - If `R` is not a row.
    /// * `FieldNotFound` - If a key field has no column.
    pub fn where_clause<R: RowValue + ?Sized>(
        &self,
        key: &PrimaryKey,
    ) -> Result<(String, Params), Error> {
        if key.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        let map = self.field_map::<R>()?;

        let mut clause = String::new();
        let mut params = Params::default();
        for (i, part) in key.parts().iter().enumerate() {
            let column = map.entry(part.field())?.column();
            let param = column.to_lowercase();
            if i > 0 {
                clause.push_str(" AND ");
            }
            self.dialect.push_identifier(&mut clause, column);
            clause.push_str(" = @");
            clause.push_str(&param);
            params.insert(param, part.value().clone());
        }
        Ok((clause, params))
    }

    /// Renders the query reading the `fields` columns of the row of `key`.
    ///
    /// # Errors
    ///
    /// Those of [`Patcher::columns`] and [`Patcher::where_clause`].
    pub fn select_statement<R, I, S>(
        &self,
        table: &str,
        fields: I,
        key: &PrimaryKey,
    ) -> Result<Statement, Error>
    where
        R: RowValue + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = self.columns::<R, I, S>(fields)?;
        self.select::<R>(table, &columns, key)
    }

    fn select<R: RowValue + ?Sized>(
        &self,
        table: &str,
        columns: &str,
        key: &PrimaryKey,
    ) -> Result<Statement, Error> {
        let (clause, params) = self.where_clause::<R>(key)?;
        let mut sql = String::with_capacity(columns.len() + clause.len() + table.len() + 20);
        sql.push_str("SELECT ");
        sql.push_str(columns);
        sql.push_str(" FROM ");
        self.dialect.push_identifier(&mut sql, table);
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
        Ok(Statement { sql, params })
    }

    /// Translates a patch plus its primary key into a column-keyed write map.
    ///
    /// Patch fields come first, then key fields. A field present in both is
    /// written once, with the key's value.
    ///
    /// # Errors
    ///
    /// * `EmptyPrimaryKey` - If `key` has no parts.
    /// * `InvalidRowType` - If `R` is not a row.
    /// * `FieldNotFound` - If a field has no column.
    pub fn resolve<R: RowValue + ?Sized>(
        &self,
        key: &PrimaryKey,
        patch: &PatchSet,
    ) -> Result<ColumnMap, Error> {
        if key.is_empty() {
            return Err(Error::EmptyPrimaryKey);
        }
        let map = self.field_map::<R>()?;

        let key_fields = key.parts().iter().map(|part| (part.field(), part.value()));
        let mut values = ColumnMap::default();
        for (field, value) in patch.iter().chain(key_fields) {
            let column = map.entry(field)?.column();
            values.insert(column.to_string(), value.clone());
        }
        Ok(values)
    }

    /// A patch set holding every column-mapped field of `R` at its zero value.
    ///
    /// # Panics
    ///
    /// If `R` is not a row; row types are checked at compile time for the
    /// types this is meant for.
    #[must_use]
    pub fn empty_patch_set<R: Row + Default>(&self) -> PatchSet {
        let map = match self.field_map::<R>() {
            Ok(map) => map,
            Err(err) => panic!("{err}"),
        };
        R::default()
            .field_values()
            .into_iter()
            .filter(|(field, _)| map.contains(field))
            .collect()
    }
}

/// Snapshot of every field of a row value.
fn snapshot<R: RowValue + ?Sized>(row: &R) -> Result<Vec<(&'static str, Value)>, Error> {
    row.row_fields().ok_or_else(|| Error::InvalidRowType {
        type_name: R::shape().type_name(),
    })
}

/// Fields of `patch` whose value differs from the one in `old`.
///
/// Entries follow the field declaration order of the row.
///
/// # Errors
///
/// * `InvalidRowType` - If `old` is not a row.
/// * `FieldNotInOld` - If a patch field is not a field of the row.
/// * `Compare` - If the old and new value of a field cannot be compared.
pub fn diff<R: RowValue + ?Sized>(old: &R, patch: &PatchSet) -> Result<DiffMap, Error> {
    let old_fields: IndexMap<&'static str, Value> = snapshot(old)?.into_iter().collect();

    let mut changed = Vec::new();
    for (field, new) in patch.iter() {
        let Some((index, _, old_value)) = old_fields.get_full(field) else {
            return Err(Error::FieldNotInOld {
                field: field.to_string(),
            });
        };
        let equal = compare::equal(old_value, new).map_err(|source| Error::Compare {
            field: field.to_string(),
            source: source.into(),
        })?;
        if !equal {
            changed.push((index, field, old_value, new));
        }
    }
    changed.sort_by_key(|(index, ..)| *index);

    tracing::trace!(
        patch_fields = patch.len(),
        changed_fields = changed.len(),
        "computed diff"
    );
    Ok(changed
        .into_iter()
        .map(|(_, field, old, new)| {
            let elem = DiffElem::changed(old.clone(), new.clone());
            (field.to_string(), elem)
        })
        .collect())
}

/// Every non-zero field of `old`, as entries without a new value.
///
/// # Errors
///
/// * `InvalidRowType` - If `old` is not a row.
pub fn delete_snapshot<R: RowValue + ?Sized>(old: &R) -> Result<DiffMap, Error> {
    let fields = snapshot(old)?;
    let total = fields.len();
    let snapshot: DiffMap = fields
        .into_iter()
        .filter(|(_, value)| !value.is_zero())
        .map(|(field, value)| (field.to_string(), DiffElem::removed(value)))
        .collect();
    tracing::trace!(
        row_fields = total,
        kept_fields = snapshot.len(),
        "computed delete snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ToValue, ValueType};
    use alloc::boxed::Box;

    crate::row! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct User {
            #[column(spanner = "Id", db = "id")]
            id: i64,
            #[column(spanner = "Name", db = "name")]
            name: String,
            #[column(spanner = "Age", db = "age")]
            age: i32,
            #[column(spanner = "Email", db = "email,omitempty")]
            email: Option<String>,
            #[column(spanner = "-", db = "-")]
            session: String,
        }
    }

    fn user() -> User {
        User {
            id: 1,
            name: "ann".into(),
            age: 30,
            email: None,
            session: "s".into(),
        }
    }

    #[test]
    fn test_columns_sorted_by_declaration() {
        let patcher = Patcher::spanner();
        let columns = patcher.columns::<User, _, _>(["age", "name"]).unwrap();
        assert_eq!(columns, "Name, Age");
        let columns = patcher.columns::<User, _, _>(["name", "age"]).unwrap();
        assert_eq!(columns, "Name, Age");

        let patcher = Patcher::postgres();
        assert_eq!(
            patcher.columns::<User, _, _>(["email", "id"]).unwrap(),
            "\"id\", \"email\""
        );
    }

    #[test]
    fn test_columns_unknown_field() {
        let patcher = Patcher::spanner();
        let err = patcher.columns::<User, _, _>(["session"]).unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
        assert_eq!(err.to_string(), "field `session` not found in struct");
        assert!(matches!(
            patcher.columns::<i32, _, _>(["id"]),
            Err(Error::InvalidRowType { .. })
        ));
    }

    #[test]
    fn test_all_and_patch_set_columns() {
        let patcher = Patcher::spanner();
        let all = patcher.all_columns::<User>().unwrap();
        assert_eq!(all, "Id, Name, Age, Email");
        let patch = PatchSet::new().set("email", Some("a@b")).set("id", 1i64);
        let columns = patcher.patch_set_columns::<User>(&patch).unwrap();
        assert_eq!(columns, "Id, Email");
    }

    #[test]
    fn test_where_clause() {
        let key = PrimaryKey::new("id", 7i64).add("name", "x");

        let (clause, params) = Patcher::spanner().where_clause::<User>(&key).unwrap();
        assert_eq!(clause, "Id = @id AND Name = @name");
        assert_eq!(params.len(), 2);
        assert_eq!(params["id"], 7i64.to_value());
        assert_eq!(params["name"], "x".to_value());

        let (clause, _) = Patcher::postgres().where_clause::<User>(&key).unwrap();
        assert_eq!(clause, "\"id\" = @id AND \"name\" = @name");
    }

    #[test]
    fn test_where_clause_errors() {
        let patcher = Patcher::spanner();
        assert!(matches!(
            patcher.where_clause::<User>(&PrimaryKey::default()),
            Err(Error::EmptyKeySet)
        ));
        assert!(matches!(
            patcher.where_clause::<User>(&PrimaryKey::new("nope", 1i64)),
            Err(Error::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_select_statement() {
        let statement = Patcher::postgres()
            .select_statement::<User, _, _>("users", ["age", "name"], &PrimaryKey::new("id", 3i64))
            .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT \"name\", \"age\" FROM \"users\" WHERE \"id\" = @id"
        );
        assert_eq!(statement.params["id"], 3i64.to_value());
    }

    #[test]
    fn test_resolve_key_wins() {
        let patcher = Patcher::spanner();
        let patch = PatchSet::new().set("id", 1i64).set("name", "bob");
        let key = PrimaryKey::new("id", 7i64);
        let values = patcher.resolve::<User>(&key, &patch).unwrap();
        let pairs: Vec<_> = values
            .iter()
            .map(|(c, v)| (c.as_str(), v.clone()))
            .collect();
        assert_eq!(pairs, [("Id", 7i64.to_value()), ("Name", "bob".to_value())]);
    }

    #[test]
    fn test_resolve_errors() {
        let patcher = Patcher::spanner();
        let patch = PatchSet::new().set("name", "bob");
        assert!(matches!(
            patcher.resolve::<User>(&PrimaryKey::default(), &patch),
            Err(Error::EmptyPrimaryKey)
        ));
        let patch = patch.set("nope", 1i64);
        assert!(matches!(
            patcher.resolve::<User>(&PrimaryKey::new("id", 1i64), &patch),
            Err(Error::FieldNotFound { field }) if field == "nope"
        ));
    }

    #[test]
    fn test_diff_keeps_changed_fields_in_declaration_order() {
        let patch = PatchSet::new()
            .set("age", 31i32)
            .set("id", 1i64)
            .set("name", "bob");
        let diff = diff(&user(), &patch).unwrap();
        assert_eq!(diff.keys().collect::<Vec<_>>(), ["name", "age"]);
        let expected = DiffElem::changed(30i32.to_value(), 31i32.to_value());
        assert_eq!(diff["age"], expected);
    }

    #[test]
    fn test_diff_unmapped_field_is_still_a_field() {
        let patch = PatchSet::new().set("session", "t");
        let diff = diff(&Box::new(user()), &patch).unwrap();
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn test_diff_errors() {
        let patch = PatchSet::new().set("missing", 1i64);
        assert!(matches!(
            diff(&user(), &patch),
            Err(Error::FieldNotInOld { field }) if field == "missing"
        ));

        let patch = PatchSet::new().set("age", 30i64);
        let err = diff(&user(), &patch).unwrap_err();
        let Error::Compare { field, source } = err else {
            panic!("expected a comparison error");
        };
        assert_eq!(field, "age");
        assert!(matches!(*source, Error::Incomparable { .. }));

        assert!(matches!(
            diff(&5i64, &PatchSet::new()),
            Err(Error::InvalidRowType { type_name: "i64" })
        ));
        assert!(matches!(
            diff(&Box::new(Box::new(user())), &PatchSet::new()),
            Err(Error::InvalidRowType { .. })
        ));
    }

    #[test]
    fn test_delete_snapshot_skips_zero_fields() {
        let old = User {
            id: 4,
            name: String::new(),
            age: 0,
            email: Some("e".into()),
            session: String::new(),
        };
        let snapshot = delete_snapshot(&old).unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), ["id", "email"]);
        assert_eq!(snapshot["id"], DiffElem::removed(4i64.to_value()));
        assert!(delete_snapshot(&"x".to_string()).is_err());
    }

    #[test]
    fn test_empty_patch_set() {
        let patch = Patcher::postgres().empty_patch_set::<User>();
        let fields: Vec<_> = patch.fields().collect();
        assert_eq!(fields, ["id", "name", "age", "email"]);
        assert_eq!(patch.get("email"), Some(&Value::nil(ValueType::String)));
        assert!(patch.iter().all(|(_, value)| value.is_zero()));
    }

    #[test]
    fn test_from_config() {
        let config = PatcherConfig {
            dialect: Dialect::Postgres,
            tag_key: Some("spanner".into()),
            change_table: "Audit".into(),
        };
        let patcher = Patcher::from_config(&config);
        assert_eq!(patcher.registry().tag_key(), "spanner");
        assert_eq!(patcher.change_table(), "Audit");
        assert_eq!(
            patcher.all_columns::<User>().unwrap(),
            "\"Id\", \"Name\", \"Age\", \"Email\""
        );
    }

    #[test]
    fn test_patcher_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Patcher>();
    }
}
