//! Turning a loaded DataSet into target-dialect SQL.

use clap::ValueEnum;
use indexmap::IndexMap;
use tracing::{debug, warn};

use oxide_etl_core::sql_utils::is_date;
use oxide_etl_core::{ConversionParams, DataSet, Driver, Record, Result, Value};

/// Kind of statement emitted per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `insert into ...`
    #[default]
    Insert,
    /// `update ... where <key>`
    Update,
    /// `delete from ... where <key>`
    Delete,
    /// Dialect insert-or-update.
    Merge,
}

impl Mode {
    const fn needs_key(self) -> bool {
        !matches!(self, Self::Insert)
    }
}

/// Re-reads text held in temporal fields with the formats of `params`, so
/// that source dates stored as text render as proper literals. Text that
/// does not parse is left as is.
pub fn normalize_temporal_text(ds: &mut DataSet, params: &ConversionParams) {
    let columns: Vec<usize> = ds
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| is_date(f.sql_type))
        .map(|(col, _)| col)
        .collect();
    for row in 0..ds.record_count() {
        for &col in &columns {
            let (Some(field), Some(Value::Text(text))) = (ds.field(col), ds.field_value(row, col))
            else {
                continue;
            };
            match ds.decode(field, Some(text), None, params, false) {
                Ok(value) => {
                    if ds.set_field_value(row, col, value).is_err() {
                        debug!(row, col, "cell vanished while normalizing");
                    }
                }
                Err(e) => debug!(row, col, error = %e, "temporal text left as is"),
            }
        }
    }
}

fn literals(
    ds: &DataSet,
    driver: &dyn Driver,
    record: &Record,
) -> Result<IndexMap<String, String>> {
    let mut fields = IndexMap::new();
    for (col, field) in ds.fields().iter().enumerate() {
        if !field.visible || field.to_delete {
            continue;
        }
        let value = record.value(col).unwrap_or(&Value::Null);
        let literal = driver.convert_value_for_storage(value, field.sql_type, false)?;
        fields.insert(field.name.clone(), literal);
    }
    Ok(fields)
}

/// One statement per record of `ds`, concatenated.
///
/// Update, delete and merge use `key`, falling back to the DataSet's key
/// fields. Records with a NULL key value, and records for which the
/// dialect produces no statement (nothing to update), are skipped.
pub fn statements(
    ds: &DataSet,
    driver: &dyn Driver,
    mode: Mode,
    key: Option<&str>,
) -> anyhow::Result<String> {
    let key = key.or_else(|| ds.key_fields()).unwrap_or_default();
    if mode.needs_key() && key.trim().is_empty() {
        anyhow::bail!("{mode:?} needs key fields; pass --key");
    }
    let key_cols: Vec<usize> = if mode.needs_key() {
        key.split(',')
            .map(str::trim)
            .filter_map(|name| ds.field_index(name))
            .collect()
    } else {
        Vec::new()
    };
    let table = ds.table_name();
    let mut sql = String::new();
    let mut skipped = 0_usize;
    for record in ds.records() {
        if key_cols.iter().any(|&col| record.value(col).map_or(true, Value::is_null)) {
            skipped += 1;
            continue;
        }
        let fields = literals(ds, driver, record)?;
        let statement = match mode {
            Mode::Insert => driver.insert_statement(&fields, table),
            Mode::Update => driver.update_statement(&fields, table, key),
            Mode::Delete => driver.delete_statement(&fields, table, key),
            Mode::Merge => driver.merge_statement(&fields, table, key),
        };
        if statement.is_empty() {
            skipped += 1;
        }
        sql.push_str(&statement);
    }
    if skipped > 0 {
        warn!(skipped, mode = ?mode, "records produced no statement");
    }
    Ok(sql)
}

/// `create table` for the shape of `ds`.
pub fn ddl(ds: &DataSet, driver: &dyn Driver) -> anyhow::Result<String> {
    Ok(driver.create_table_statement(ds, None)?)
}
