//! The in-memory table at the center of the ETL core.
//!
//! A [`DataSet`] owns an ordered field list and an ordered record list whose
//! cells are index-aligned with the fields. Optional key fields give O(1)
//! lookup through a lazily rebuilt index. Mutating methods that can change
//! row positions or key values invalidate that index.
//!
//! A DataSet is not internally synchronized: callers that share one across
//! threads must serialize access themselves.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::trace;

use crate::data::DataSetData;
use crate::driver::Driver;
use crate::error::{EtlError, Result};
use crate::field::FieldDef;
use crate::filter::Filter;
use crate::record::Record;
use crate::sql_utils;
use crate::value::Value;

/// Field attribute holding the per-field encode flag (`"true"`/`"false"`).
pub const ENCODE_ATTR: &str = "encode";

/// Separator placed between key parts when several key fields form a key.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Caller-supplied acceptance check consulted by [`DataSet::add_record`].
pub type RecordPredicate = Arc<dyn Fn(&DataSet, &Record) -> bool + Send + Sync>;

static SORT_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\S+)(?:\s+(asc|desc))?\s*$").expect("sort term pattern is valid")
});

/// An in-memory table.
#[derive(Clone, Default)]
pub struct DataSet {
    name: String,
    table_name: Option<String>,
    fields: Vec<FieldDef>,
    field_names: HashMap<String, usize>,
    data: DataSetData,
    key_fields: Option<String>,
    filter: Option<Filter>,
    attributes: HashMap<String, HashMap<String, String>>,
    driver: Option<Arc<dyn Driver>>,
    key_index: OnceCell<HashMap<String, usize>>,
    record_predicate: Option<RecordPredicate>,
}

impl DataSet {
    /// Creates an empty DataSet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Sets the key fields.
    #[must_use]
    pub fn with_key_fields(mut self, key_fields: &str) -> Self {
        self.set_key_fields(Some(key_fields));
        self
    }

    /// Adds fields, builder style.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        for field in fields {
            self.add_field(field);
        }
        self
    }

    /// DataSet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the DataSet.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Table name; defaults to the DataSet name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    /// Sets the table name.
    pub fn set_table_name(&mut self, table_name: Option<String>) {
        self.table_name = table_name;
    }

    /// Owning driver, if any.
    #[must_use]
    pub fn driver(&self) -> Option<&Arc<dyn Driver>> {
        self.driver.as_ref()
    }

    /// Sets the owning driver.
    pub fn set_driver(&mut self, driver: Option<Arc<dyn Driver>>) {
        self.driver = driver;
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    /// Field definitions in column order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    /// Field by exact (case-sensitive) name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Index of a field by exact name.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.get(name).copied()
    }

    /// Secondary lookup keyed by upper-case, lower-case and original name.
    #[must_use]
    pub fn non_case_sensitive_fields(&self) -> HashMap<String, usize> {
        let mut map = HashMap::with_capacity(self.fields.len() * 3);
        for (i, field) in self.fields.iter().enumerate() {
            map.entry(field.name.to_uppercase()).or_insert(i);
            map.entry(field.name.to_lowercase()).or_insert(i);
            map.entry(field.name.clone()).or_insert(i);
        }
        map
    }

    /// Appends a field and returns its index. Existing records get a NULL
    /// cell for it.
    pub fn add_field(&mut self, field: FieldDef) -> usize {
        let index = self.fields.len();
        self.field_names.entry(field.name.clone()).or_insert(index);
        if self.is_key_field(&field.name) {
            self.invalidate_index();
        }
        self.fields.push(field);
        for record in self.data.iter_mut() {
            if record.len() < index + 1 {
                record.resize(index + 1);
            }
        }
        index
    }

    /// Inserts a field at `index`, inserting a NULL cell into every record.
    pub fn insert_field(&mut self, index: usize, field: FieldDef) -> Result<()> {
        if index > self.fields.len() {
            return Err(EtlError::IndexOutOfBounds {
                index,
                len: self.fields.len(),
            });
        }
        self.fields.insert(index, field);
        for record in self.data.iter_mut() {
            record.insert_cell(index, Value::Null);
        }
        self.rebuild_field_names();
        self.invalidate_index();
        Ok(())
    }

    /// Removes the field at `index` together with its cells.
    pub fn remove_field(&mut self, index: usize) -> Result<FieldDef> {
        if index >= self.fields.len() {
            return Err(EtlError::IndexOutOfBounds {
                index,
                len: self.fields.len(),
            });
        }
        let field = self.fields.remove(index);
        for record in self.data.iter_mut() {
            record.remove_cell(index);
        }
        self.attributes.remove(&field.name);
        self.rebuild_field_names();
        self.invalidate_index();
        Ok(field)
    }

    /// Mutates a field definition in place. Renames are picked up by name
    /// lookup.
    pub fn update_field(&mut self, index: usize, f: impl FnOnce(&mut FieldDef)) -> Result<()> {
        let len = self.fields.len();
        let field = self
            .fields
            .get_mut(index)
            .ok_or(EtlError::IndexOutOfBounds { index, len })?;
        f(field);
        self.rebuild_field_names();
        self.invalidate_index();
        Ok(())
    }

    fn rebuild_field_names(&mut self) {
        self.field_names.clear();
        for (i, field) in self.fields.iter().enumerate() {
            self.field_names.entry(field.name.clone()).or_insert(i);
        }
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// The record storage.
    #[must_use]
    pub fn data(&self) -> &DataSetData {
        &self.data
    }

    /// Number of records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.data.get(index)
    }

    /// Mutable record at `index`. Invalidates the key index.
    pub fn record_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.invalidate_index();
        self.data.get_mut(index)
    }

    /// Iterates over records in row order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.data.iter()
    }

    /// Appends a record.
    ///
    /// Returns `false`, without adding, when the filter expression or the
    /// record predicate rejects the record. Connectors use the return value
    /// to decide whether to fire per-record callbacks.
    pub fn add_record(&mut self, record: Record) -> bool {
        if !self.accepts(&record) {
            return false;
        }
        self.data.push(record);
        self.invalidate_index();
        true
    }

    /// Inserts a record at `index`, subject to the same acceptance rules as
    /// [`DataSet::add_record`].
    pub fn add_record_at(&mut self, record: Record, index: usize) -> Result<bool> {
        if index > self.data.len() {
            return Err(EtlError::IndexOutOfBounds {
                index,
                len: self.data.len(),
            });
        }
        if !self.accepts(&record) {
            return Ok(false);
        }
        self.data.insert(index, record);
        self.invalidate_index();
        Ok(true)
    }

    /// Removes and returns the record at `index`.
    pub fn delete_record(&mut self, index: usize) -> Result<Record> {
        if index >= self.data.len() {
            return Err(EtlError::IndexOutOfBounds {
                index,
                len: self.data.len(),
            });
        }
        self.invalidate_index();
        Ok(self.data.remove(index))
    }

    /// Replaces the record at `index`, returning the old one.
    pub fn set_record(&mut self, index: usize, record: Record) -> Result<Record> {
        if index >= self.data.len() {
            return Err(EtlError::IndexOutOfBounds {
                index,
                len: self.data.len(),
            });
        }
        self.invalidate_index();
        Ok(self.data.replace(index, record))
    }

    /// Removes all records, keeping fields.
    pub fn clear_records(&mut self) {
        self.data.clear();
        self.invalidate_index();
    }

    /// Removes all fields, records and field attributes. The DataSet keeps
    /// its name, table name and driver and can be reused.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.field_names.clear();
        self.attributes.clear();
        self.clear_records();
    }

    fn accepts(&self, record: &Record) -> bool {
        if let Some(filter) = &self.filter {
            if !filter.matches(self, record) {
                trace!(dataset = %self.name, "record rejected by filter");
                return false;
            }
        }
        if let Some(predicate) = &self.record_predicate {
            if !predicate(self, record) {
                trace!(dataset = %self.name, "record rejected by predicate");
                return false;
            }
        }
        true
    }

    /// Installs or removes the caller-supplied record predicate.
    pub fn set_record_predicate(&mut self, predicate: Option<RecordPredicate>) {
        self.record_predicate = predicate;
    }

    // ------------------------------------------------------------------
    // Cell access
    // ------------------------------------------------------------------

    /// Primary value at `(row, col)`.
    #[must_use]
    pub fn field_value(&self, row: usize, col: usize) -> Option<&Value> {
        self.data.get(row)?.value(col)
    }

    /// Primary value at `row` for the named field.
    #[must_use]
    pub fn field_value_by_name(&self, row: usize, name: &str) -> Option<&Value> {
        self.field_value(row, self.field_index(name)?)
    }

    /// Replaces the primary value at `(row, col)`.
    pub fn set_field_value(&mut self, row: usize, col: usize, value: Value) -> Result<()> {
        let len = self.data.len();
        let record = self
            .data
            .get_mut(row)
            .ok_or(EtlError::IndexOutOfBounds { index: row, len })?;
        let width = record.len();
        if !record.set_value(col, value) {
            return Err(EtlError::IndexOutOfBounds {
                index: col,
                len: width,
            });
        }
        self.invalidate_index();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Comma-delimited key field names.
    #[must_use]
    pub fn key_fields(&self) -> Option<&str> {
        self.key_fields.as_deref()
    }

    /// Sets or clears the key fields. Blank input clears them.
    pub fn set_key_fields(&mut self, key_fields: Option<&str>) {
        self.key_fields = key_fields
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from);
        self.invalidate_index();
    }

    fn is_key_field(&self, name: &str) -> bool {
        self.key_fields
            .as_deref()
            .is_some_and(|keys| keys.split(',').any(|k| k.trim() == name))
    }

    /// Column indexes of the key fields, or `None` when no key is set or a
    /// key field does not exist.
    #[must_use]
    pub fn key_field_indexes(&self) -> Option<Vec<usize>> {
        let keys = self.key_fields.as_deref()?;
        keys.split(',')
            .map(|k| self.field_index(k.trim()))
            .collect()
    }

    /// Builds the key of `record` from the key fields. `None` when there is no
    /// usable key or any key part is NULL.
    #[must_use]
    pub fn key_of(&self, record: &Record) -> Option<String> {
        let indexes = self.key_field_indexes()?;
        compose_key(record, &indexes)
    }

    /// Looks a record up by key text. Composite keys join their parts with
    /// [`KEY_SEPARATOR`]. When several records share a key, the first one
    /// wins.
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&Record> {
        self.find_index_by_key(key).and_then(|i| self.data.get(i))
    }

    /// Row index of the record with the given key.
    #[must_use]
    pub fn find_index_by_key(&self, key: &str) -> Option<usize> {
        self.key_index
            .get_or_init(|| self.build_key_index())
            .get(key)
            .copied()
    }

    fn build_key_index(&self) -> HashMap<String, usize> {
        let mut index = HashMap::with_capacity(self.data.len());
        if let Some(indexes) = self.key_field_indexes() {
            for (row, record) in self.data.iter().enumerate() {
                if let Some(key) = compose_key(record, &indexes) {
                    index.entry(key).or_insert(row);
                }
            }
        }
        index
    }

    fn invalidate_index(&mut self) {
        self.key_index.take();
    }

    // ------------------------------------------------------------------
    // Filter, attributes
    // ------------------------------------------------------------------

    /// Parses and installs a filter expression evaluated by
    /// [`DataSet::add_record`]. `None` or blank text removes the filter.
    pub fn set_filter(&mut self, expression: Option<&str>) -> Result<()> {
        self.filter = match expression.map(str::trim).filter(|e| !e.is_empty()) {
            Some(text) => Some(Filter::parse(text)?),
            None => None,
        };
        Ok(())
    }

    /// The installed filter.
    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Sets a named attribute on a field.
    pub fn set_field_attribute(
        &mut self,
        field: &str,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes
            .entry(field.to_string())
            .or_default()
            .insert(attribute.into(), value.into());
    }

    /// Reads a named attribute of a field.
    #[must_use]
    pub fn field_attribute(&self, field: &str, attribute: &str) -> Option<&str> {
        self.attributes
            .get(field)?
            .get(attribute)
            .map(String::as_str)
    }

    /// Whether values of `field` go through the reversible codec: the
    /// [`ENCODE_ATTR`] attribute or the field's own flag is set, or the type
    /// is a large object that cannot be written as plain text.
    #[must_use]
    pub fn is_field_encoded(&self, field: &FieldDef) -> bool {
        field.encode
            || sql_utils::is_large_object(field.sql_type)
            || self
                .field_attribute(&field.name, ENCODE_ATTR)
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    // ------------------------------------------------------------------
    // Sorting and selection
    // ------------------------------------------------------------------

    /// Stable sort by a `"field [asc|desc][, field [asc|desc]...]"`
    /// expression. Ascending is the default.
    pub fn sort_by_string(&mut self, expression: &str) -> Result<()> {
        let mut terms = Vec::new();
        for term in expression.split(',') {
            let caps = SORT_TERM
                .captures(term)
                .ok_or_else(|| EtlError::InvalidSortExpression(expression.to_string()))?;
            let name = &caps[1];
            let col = self
                .field_index(name)
                .ok_or_else(|| EtlError::UnknownField(name.to_string()))?;
            let descending = caps
                .get(2)
                .is_some_and(|d| d.as_str().eq_ignore_ascii_case("desc"));
            terms.push((col, descending));
        }

        self.data.as_mut_slice().sort_by(|a, b| {
            for &(col, descending) in &terms {
                let ord = match (a.value(col), b.value(col)) {
                    (Some(x), Some(y)) => x.compare(y),
                    _ => Ordering::Equal,
                };
                let ord = if descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        self.invalidate_index();
        Ok(())
    }

    /// Returns a new DataSet holding only the given rows and columns, in the
    /// order given.
    pub fn selected(&self, rows: &[usize], cols: &[usize]) -> Result<Self> {
        let mut result = self.empty_like();
        result.fields.clear();
        result.field_names.clear();
        for &col in cols {
            let field = self.fields.get(col).ok_or(EtlError::IndexOutOfBounds {
                index: col,
                len: self.fields.len(),
            })?;
            result.add_field(field.clone());
        }
        for &row in rows {
            let record = self.data.get(row).ok_or(EtlError::IndexOutOfBounds {
                index: row,
                len: self.data.len(),
            })?;
            let values = cols
                .iter()
                .map(|&col| record.value(col).cloned().unwrap_or_default())
                .collect();
            result.data.push(Record::new(values));
        }
        Ok(result)
    }

    /// A DataSet with the same name, table, key fields, attributes, driver and
    /// field list but no records.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            table_name: self.table_name.clone(),
            fields: self.fields.clone(),
            field_names: self.field_names.clone(),
            data: DataSetData::new(),
            key_fields: self.key_fields.clone(),
            filter: None,
            attributes: self.attributes.clone(),
            driver: self.driver.clone(),
            key_index: OnceCell::new(),
            record_predicate: None,
        }
    }

    /// Like [`DataSet::empty_like`], with `fields` as the field list.
    pub(crate) fn empty_with_fields(&self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        let mut result = self.empty_like();
        result.fields.clear();
        result.field_names.clear();
        for field in fields {
            result.add_field(field);
        }
        result
    }

    /// Appends a record bypassing the filter and predicate. Used by
    /// operators that build a result from already-accepted rows.
    pub(crate) fn push_record(&mut self, record: Record) {
        self.data.push(record);
        self.invalidate_index();
    }

    pub(crate) fn take_contents(&mut self) -> (Vec<FieldDef>, DataSetData) {
        let fields = std::mem::take(&mut self.fields);
        let data = std::mem::take(&mut self.data);
        self.field_names.clear();
        self.attributes.clear();
        self.invalidate_index();
        (fields, data)
    }
}

pub(crate) fn compose_key(record: &Record, indexes: &[usize]) -> Option<String> {
    let mut key = String::new();
    for (n, &col) in indexes.iter().enumerate() {
        let text = record.value(col)?.as_text()?;
        if n > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&text);
    }
    Some(key)
}

/// Two DataSets are equal when their field definitions (name, types, size)
/// and records (primary values) are equal positionally. Names, table names,
/// keys and cell versions are not compared.
impl PartialEq for DataSet {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.same_definition(b))
            && self.data == other.data
    }
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("records", &self.data.len())
            .field("key_fields", &self.key_fields)
            .field("driver", &self.driver.as_ref().map(|d| d.name()))
            .finish_non_exhaustive()
    }
}
