//! Populating a DataSet from a query result.

use std::collections::HashSet;
use std::ops::ControlFlow;

use indexmap::IndexMap;
use tracing::{debug, info};

use super::{format_range, is_binary, is_char, is_decimal, is_long_char};
use crate::dataset::{DataSet, KEY_SEPARATOR};
use crate::driver::Driver;
use crate::error::Result;
use crate::field::FieldDef;
use crate::record::Record;
use crate::types::SqlType;
use crate::value::Value;

/// Column metadata reported by a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column label.
    pub name: String,
    /// Semantic type.
    pub sql_type: SqlType,
    /// Native type name as reported by the database.
    pub type_name: String,
    /// Precision, when the driver reports one.
    pub precision: Option<u32>,
    /// Scale as reported; some drivers report sentinel values.
    pub scale: Option<i32>,
    /// Display size, used when no precision is reported.
    pub display_size: Option<u32>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the database generates the value.
    pub auto_increment: bool,
}

impl ColumnMeta {
    /// Creates nullable column metadata whose type name is the canonical
    /// name of `sql_type`.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            type_name: sql_type.as_str().to_string(),
            precision: None,
            scale: None,
            display_size: None,
            nullable: true,
            auto_increment: false,
        }
    }
}

/// A forward-only cursor over already-fetched or streamed rows.
pub trait ResultSet {
    /// Column metadata, in column order.
    fn columns(&self) -> &[ColumnMeta];

    /// The next row, or `None` when exhausted. Rows are index-aligned with
    /// [`ResultSet::columns`].
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// A [`ResultSet`] over rows held in memory.
#[derive(Debug, Clone)]
pub struct VecResultSet {
    columns: Vec<ColumnMeta>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl VecResultSet {
    /// Creates a result set from metadata and rows.
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl ResultSet for VecResultSet {
    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }
}

/// Options for [`populate_data_set`].
#[derive(Debug, Clone, Default)]
pub struct PopulateOptions {
    /// Source column name to DataSet field name. When set, only mapped
    /// columns are read, in mapping order.
    pub fields_mapping: Option<IndexMap<String, String>>,
    /// Skip rows whose full text is identical to an earlier row.
    pub unique: bool,
    /// Skip rows with a NULL in any key field of the DataSet.
    pub check_key_field: bool,
    /// Only keep rows where this field equals `filter_by_value`.
    pub filter_by_field: Option<String>,
    /// Value compared against `filter_by_field`; `None` matches NULL.
    pub filter_by_value: Option<String>,
    /// Stop after this many rows have been added.
    pub max_rows: Option<usize>,
}

/// One column of the result mapped onto one DataSet field.
struct ColumnPlan {
    source: usize,
    target: usize,
}

fn field_from_meta(name: &str, meta: &ColumnMeta, wrong_scale: Option<i32>) -> FieldDef {
    let precision = meta.precision.filter(|p| *p > 0).or(meta.display_size);
    let scale = meta
        .scale
        .filter(|s| Some(*s) != wrong_scale)
        .and_then(|s| u32::try_from(s).ok());
    let t = meta.sql_type;
    let sized = (is_char(t) && !is_long_char(t))
        || is_decimal(t)
        || matches!(t, SqlType::Binary | SqlType::VarBinary);

    let mut field = FieldDef::new(name, t);
    field.native_type = meta.type_name.clone();
    field.size = meta.display_size;
    field.nullable = meta.nullable;
    field.auto_increment = meta.auto_increment;
    if sized && !meta.type_name.contains('(') {
        if let Some(p) = precision {
            let scale = if is_decimal(t) { scale } else { None };
            field.native_type = format!("{}{}", meta.type_name, format_range(p, scale));
            field.has_params = true;
        }
    }
    if is_char(t) || is_decimal(t) || is_binary(t) {
        field.precision = precision;
        field.scale = if is_decimal(t) { scale } else { None };
    }
    if meta.type_name.contains('(') {
        field = field.native_type(meta.type_name.clone());
    }
    field
}

fn plan_columns(
    ds: &mut DataSet,
    columns: &[ColumnMeta],
    options: &PopulateOptions,
    wrong_scale: Option<i32>,
) -> Vec<ColumnPlan> {
    let pairs: Vec<(usize, String)> = match &options.fields_mapping {
        Some(mapping) => mapping
            .iter()
            .filter_map(|(source, target)| {
                let found = columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(source));
                if found.is_none() {
                    debug!(column = %source, "mapped column not present in result");
                }
                found.map(|i| (i, target.clone()))
            })
            .collect(),
        None => columns
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.name.clone()))
            .collect(),
    };

    pairs
        .into_iter()
        .map(|(source, name)| {
            let target = ds.field_index(&name).unwrap_or_else(|| {
                let field = field_from_meta(&name, &columns[source], wrong_scale);
                debug!(
                    dataset = %ds.name(),
                    field = %field.name,
                    native_type = %field.native_type,
                    "adding field from result metadata"
                );
                ds.add_field(field)
            });
            ColumnPlan { source, target }
        })
        .collect()
}

fn row_text(values: &[Value]) -> String {
    let mut text = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            text.push(KEY_SEPARATOR);
        }
        match value.as_text() {
            Some(t) => text.push_str(&t),
            None => text.push('\0'),
        }
    }
    text
}

const fn row_budget(added: usize, max_rows: Option<usize>) -> ControlFlow<()> {
    match max_rows {
        Some(max) if added >= max => ControlFlow::Break(()),
        _ => ControlFlow::Continue(()),
    }
}

/// Reads every row of `result` into `ds` and returns how many records were
/// added.
///
/// When `ds` has no fields yet they are built from the result metadata:
/// precision falls back to the display size, and a scale equal to the
/// driver's [`Driver::wrong_scale`] sentinel is dropped. Existing fields are
/// matched by name. Rows rejected by the options, the DataSet filter or
/// its record predicate are skipped. Reaching `max_rows` ends reading
/// early and is not an error.
pub fn populate_data_set(
    ds: &mut DataSet,
    driver: &dyn Driver,
    result: &mut dyn ResultSet,
    options: &PopulateOptions,
) -> Result<usize> {
    let columns = result.columns().to_vec();
    let plan = plan_columns(ds, &columns, options, driver.wrong_scale());
    let width = ds.field_count();

    let key_indexes = if options.check_key_field {
        ds.key_field_indexes()
    } else {
        None
    };
    let filter_index = match options.filter_by_field.as_deref() {
        Some(name) => match ds.field_index(name) {
            Some(i) => Some(i),
            None => {
                debug!(field = %name, "filter field not present, no rows will match");
                return Ok(0);
            }
        },
        None => None,
    };

    let mut seen = HashSet::new();
    let mut added = 0;
    let mut read = 0;
    loop {
        if let ControlFlow::Break(()) = row_budget(added, options.max_rows) {
            info!(dataset = %ds.name(), rows = added, "max rows reached, stopping");
            break;
        }
        let Some(mut row) = result.next_row()? else {
            break;
        };
        read += 1;

        let mut values = vec![Value::Null; width];
        for col in &plan {
            if let Some(value) = row.get_mut(col.source) {
                values[col.target] = std::mem::take(value);
            }
        }

        if let Some(indexes) = &key_indexes {
            if indexes.iter().any(|&i| values[i].is_null()) {
                debug!(row = read, "skipping row with null key");
                continue;
            }
        }
        if let Some(i) = filter_index {
            let matched = match (values[i].as_text(), options.filter_by_value.as_deref()) {
                (Some(actual), Some(expected)) => actual == expected,
                (None, None) => true,
                _ => false,
            };
            if !matched {
                continue;
            }
        }
        if options.unique && !seen.insert(row_text(&values)) {
            debug!(row = read, "skipping duplicate row");
            continue;
        }

        if ds.add_record(Record::new(values)) {
            added += 1;
        }
    }
    debug!(dataset = %ds.name(), read, added, "population finished");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{GenericDriver, OracleDriver};

    fn columns() -> Vec<ColumnMeta> {
        let mut id = ColumnMeta::new("ID", SqlType::Integer);
        id.nullable = false;
        let mut name = ColumnMeta::new("NAME", SqlType::Varchar);
        name.type_name = "VARCHAR2".into();
        name.display_size = Some(40);
        let mut amount = ColumnMeta::new("AMOUNT", SqlType::Numeric);
        amount.type_name = "NUMBER".into();
        amount.precision = Some(10);
        amount.scale = Some(2);
        vec![id, name, amount]
    }

    fn rows() -> Vec<Vec<Value>> {
        vec![
            vec![Value::Int(1), Value::Text("a".into()), Value::Float(1.5)],
            vec![Value::Int(2), Value::Text("b".into()), Value::Null],
            vec![Value::Int(1), Value::Text("a".into()), Value::Float(1.5)],
            vec![Value::Null, Value::Text("c".into()), Value::Null],
        ]
    }

    #[test]
    fn test_builds_fields_from_metadata() {
        let mut ds = DataSet::new("t");
        let mut rs = VecResultSet::new(columns(), rows());
        let added =
            populate_data_set(&mut ds, &GenericDriver::new(), &mut rs, &PopulateOptions::default())
                .unwrap();
        assert_eq!(added, 4);
        assert_eq!(ds.field_count(), 3);

        let name = ds.field_by_name("NAME").unwrap();
        assert_eq!(name.native_type, "VARCHAR2(40)");
        assert_eq!(name.precision, Some(40));
        let amount = ds.field_by_name("AMOUNT").unwrap();
        assert_eq!(amount.native_type, "NUMBER(10,2)");
        assert!(!ds.field_by_name("ID").unwrap().nullable);
    }

    #[test]
    fn test_wrong_scale_is_dropped() {
        let mut cols = columns();
        cols[2].scale = Some(-127);
        let mut ds = DataSet::new("t");
        let mut rs = VecResultSet::new(cols, vec![]);
        populate_data_set(&mut ds, &OracleDriver, &mut rs, &PopulateOptions::default()).unwrap();
        let amount = ds.field_by_name("AMOUNT").unwrap();
        assert_eq!(amount.scale, None);
        assert_eq!(amount.native_type, "NUMBER(10)");
    }

    #[test]
    fn test_unique_key_check_and_max_rows() {
        let mut ds = DataSet::new("t").with_key_fields("ID");
        let options = PopulateOptions {
            unique: true,
            check_key_field: true,
            ..PopulateOptions::default()
        };
        let mut rs = VecResultSet::new(columns(), rows());
        assert_eq!(
            populate_data_set(&mut ds, &GenericDriver::new(), &mut rs, &options).unwrap(),
            2
        );

        let mut ds = DataSet::new("t");
        let options = PopulateOptions {
            max_rows: Some(3),
            ..PopulateOptions::default()
        };
        let mut rs = VecResultSet::new(columns(), rows());
        assert_eq!(
            populate_data_set(&mut ds, &GenericDriver::new(), &mut rs, &options).unwrap(),
            3
        );
        assert_eq!(ds.record_count(), 3);
    }

    #[test]
    fn test_fields_mapping_and_value_filter() {
        let mut mapping = IndexMap::new();
        mapping.insert("name".to_string(), "label".to_string());
        mapping.insert("id".to_string(), "key".to_string());
        mapping.insert("missing".to_string(), "nothing".to_string());
        let options = PopulateOptions {
            fields_mapping: Some(mapping),
            filter_by_field: Some("label".into()),
            filter_by_value: Some("a".into()),
            ..PopulateOptions::default()
        };
        let mut ds = DataSet::new("t");
        let mut rs = VecResultSet::new(columns(), rows());
        let added = populate_data_set(&mut ds, &GenericDriver::new(), &mut rs, &options).unwrap();

        assert_eq!(added, 2);
        let names: Vec<_> = ds.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["label", "key"]);
        assert_eq!(ds.field_value(0, 1), Some(&Value::Int(1)));
    }

    #[test]
    fn test_existing_fields_are_reused() {
        let mut ds = DataSet::new("t").with_fields([
            FieldDef::new("AMOUNT", SqlType::Numeric),
            FieldDef::new("ID", SqlType::Integer),
        ]);
        let mut rs = VecResultSet::new(columns(), rows());
        populate_data_set(&mut ds, &GenericDriver::new(), &mut rs, &PopulateOptions::default())
            .unwrap();
        assert_eq!(ds.field_count(), 3);
        assert_eq!(ds.field_value(0, 0), Some(&Value::Float(1.5)));
        assert_eq!(ds.field_value(0, 1), Some(&Value::Int(1)));
        assert_eq!(ds.field_value(0, 2), Some(&Value::Text("a".into())));
    }
}
