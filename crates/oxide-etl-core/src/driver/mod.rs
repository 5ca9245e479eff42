//! SQL dialect drivers.
//!
//! A [`Driver`] turns DataSet fields and values into SQL text for one
//! database: DDL types, literals, INSERT/UPDATE/DELETE/MERGE statements and
//! the procedural fragments used in generated batch scripts.
//!
//! Most of the contract has ANSI/PL-SQL flavored default methods; each
//! dialect overrides what its syntax needs. Size limits are declared per
//! dialect in [`DriverLimits`], or delegated to a parent driver.
//!
//! ```rust
//! use indexmap::IndexMap;
//! use oxide_etl_core::driver::{Driver, GenericDriver};
//!
//! let mut fields = IndexMap::new();
//! fields.insert("field1".to_string(), "123".to_string());
//! fields.insert("field2".to_string(), "'abc'".to_string());
//!
//! let sql = GenericDriver::new().insert_statement(&fields, "test");
//! assert_eq!(sql, "insert into test(\nfield1,\nfield2\n) values (\n123,\n'abc'\n);\n");
//! ```

mod generic;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use generic::GenericDriver;
pub use mysql::MySqlDriver;
pub use oracle::OracleDriver;
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;
pub use sqlserver::SqlServerDriver;

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::codec::parse_bool;
use crate::dataset::DataSet;
use crate::error::{EtlError, Result};
use crate::field::FieldDef;
use crate::repository::FieldsRepository;
use crate::sql_utils::{
    format_range, is_binary, is_boolean, is_char, is_date, is_decimal, is_fixed_char, is_number,
};
use crate::types::SqlType;
use crate::value::{Value, DEFAULT_DATE_FORMAT, DEFAULT_TIMESTAMP_FORMAT, DEFAULT_TIME_FORMAT};

/// Timestamp pattern used when rendering timestamp literals.
pub const LITERAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Size limits declared by a dialect. `None` means "ask the parent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverLimits {
    /// Longest fixed-length character column.
    pub max_char_size: Option<u32>,
    /// Longest variable-length character column.
    pub max_varchar_size: Option<u32>,
    /// Largest numeric precision.
    pub max_precision: Option<u32>,
    /// Largest numeric scale.
    pub max_scale: Option<u32>,
    /// Longest string literal, quotes included.
    pub max_string_literal_size: Option<u32>,
}

impl DriverLimits {
    /// Limits with every value declared.
    #[must_use]
    pub const fn declared(
        char: u32,
        varchar: u32,
        precision: u32,
        scale: u32,
        literal: u32,
    ) -> Self {
        Self {
            max_char_size: Some(char),
            max_varchar_size: Some(varchar),
            max_precision: Some(precision),
            max_scale: Some(scale),
            max_string_literal_size: Some(literal),
        }
    }
}

/// One of the size limits of [`DriverLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// [`DriverLimits::max_char_size`]
    CharSize,
    /// [`DriverLimits::max_varchar_size`]
    VarcharSize,
    /// [`DriverLimits::max_precision`]
    Precision,
    /// [`DriverLimits::max_scale`]
    Scale,
    /// [`DriverLimits::max_string_literal_size`]
    StringLiteralSize,
}

impl Limit {
    /// Limit name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CharSize => "max char size",
            Self::VarcharSize => "max varchar size",
            Self::Precision => "max precision",
            Self::Scale => "max scale",
            Self::StringLiteralSize => "max string literal size",
        }
    }

    const fn of(self, limits: &DriverLimits) -> Option<u32> {
        match self {
            Self::CharSize => limits.max_char_size,
            Self::VarcharSize => limits.max_varchar_size,
            Self::Precision => limits.max_precision,
            Self::Scale => limits.max_scale,
            Self::StringLiteralSize => limits.max_string_literal_size,
        }
    }
}

/// Splits a comma-delimited key list, dropping blanks.
pub(crate) fn key_list(key_fields: &str) -> Vec<&str> {
    key_fields
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect()
}

fn is_key(name: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| k.eq_ignore_ascii_case(name))
}

fn value_of<'a>(fields: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(field, _)| field.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// `k1=v1 and k2=v2`, or `None` when a key is missing from `fields`.
pub(crate) fn key_predicate(fields: &IndexMap<String, String>, keys: &[&str]) -> Option<String> {
    let parts = keys
        .iter()
        .map(|k| value_of(fields, k).map(|v| format!("{k}={v}")))
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(" and "))
}

/// The non-key fields of `fields`.
pub(crate) fn non_key_fields<'a>(
    fields: &'a IndexMap<String, String>,
    keys: &[&str],
) -> Vec<(&'a str, &'a str)> {
    fields
        .iter()
        .filter(|(name, _)| !is_key(name, keys))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

/// `insert into T(\n...\n) values (\n...\n)` without the terminator.
pub(crate) fn insert_body(fields: &IndexMap<String, String>, table: &str) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    let values: Vec<&str> = fields.values().map(String::as_str).collect();
    Some(format!(
        "insert into {table}(\n{}\n) values (\n{}\n)",
        names.join(",\n"),
        values.join(",\n")
    ))
}

/// Keys of a statement, or `None` when the statement cannot be built.
fn statement_keys<'a>(
    fields: &IndexMap<String, String>,
    key_fields: &'a str,
) -> Option<Vec<&'a str>> {
    let keys = key_list(key_fields);
    (!fields.is_empty() && !keys.is_empty()).then_some(keys)
}

/// Insert-or-update guarded by an existence check, in the driver's
/// conditional-block syntax.
pub(crate) fn conditional_merge<D: Driver + ?Sized>(
    driver: &D,
    fields: &IndexMap<String, String>,
    table: &str,
    key_fields: &str,
) -> String {
    let Some(keys) = statement_keys(fields, key_fields) else {
        return String::new();
    };
    let Some(predicate) = key_predicate(fields, &keys) else {
        return String::new();
    };
    let insert = driver.insert_statement(fields, table);
    let update = driver.update_statement(fields, table, key_fields);

    let mut sql = format!(
        "{}(not exists (select 1 from {table} where {predicate})){}{insert}",
        driver.if_(),
        driver.if_begin()
    );
    if !update.is_empty() {
        sql.push_str(driver.if_else());
        sql.push_str(&update);
    }
    sql.push_str(driver.if_end());
    sql
}

/// A database dialect.
///
/// Statement builders return an empty string, never an error, when the
/// input cannot produce a statement (no fields, no keys, a key missing from
/// the fields). Limit accessors fail with [`EtlError::UnconfiguredLimit`]
/// when neither the driver nor any parent declares the limit.
pub trait Driver: fmt::Debug + Send + Sync {
    /// Dialect name, as accepted by [`by_name`].
    fn name(&self) -> &'static str;

    /// Limits declared by this driver itself.
    fn limits(&self) -> &DriverLimits;

    /// Driver consulted for limits this one does not declare.
    fn parent(&self) -> Option<&dyn Driver> {
        None
    }

    /// Resolves a limit through the parent chain.
    fn limit(&self, limit: Limit) -> Result<u32> {
        if let Some(value) = limit.of(self.limits()) {
            return Ok(value);
        }
        let mut parent = self.parent();
        while let Some(driver) = parent {
            if let Some(value) = limit.of(driver.limits()) {
                return Ok(value);
            }
            parent = driver.parent();
        }
        warn!(driver = self.name(), limit = limit.name(), "size limit is not configured");
        Err(EtlError::UnconfiguredLimit {
            driver: self.name().to_string(),
            limit: limit.name(),
        })
    }

    /// Longest fixed-length character column.
    fn max_char_size(&self) -> Result<u32> {
        self.limit(Limit::CharSize)
    }

    /// Longest variable-length character column.
    fn max_varchar_size(&self) -> Result<u32> {
        self.limit(Limit::VarcharSize)
    }

    /// Largest numeric precision.
    fn max_precision(&self) -> Result<u32> {
        self.limit(Limit::Precision)
    }

    /// Largest numeric scale.
    fn max_scale(&self) -> Result<u32> {
        self.limit(Limit::Scale)
    }

    /// Longest string literal, quotes included.
    fn max_string_literal_size(&self) -> Result<u32> {
        self.limit(Limit::StringLiteralSize)
    }

    /// Scale the database reports for numbers declared without one.
    fn wrong_scale(&self) -> Option<i32> {
        None
    }

    /// Date pattern the database renders dates with.
    fn date_format(&self) -> Option<&'static str> {
        None
    }

    /// Time pattern the database renders times with.
    fn time_format(&self) -> Option<&'static str> {
        None
    }

    /// Timestamp pattern the database renders timestamps with.
    fn timestamp_format(&self) -> Option<&'static str> {
        None
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Native base type for a SQL type.
    fn type_mapping(&self, sql_type: SqlType) -> &'static str;

    /// Whether the native type of `sql_type` takes a size suffix.
    fn is_sized(&self, sql_type: SqlType) -> bool {
        matches!(
            sql_type,
            SqlType::Char
                | SqlType::NChar
                | SqlType::Varchar
                | SqlType::NVarchar
                | SqlType::Numeric
                | SqlType::Decimal
                | SqlType::Binary
                | SqlType::VarBinary
        )
    }

    /// DDL type of `field` in this dialect.
    ///
    /// A repository entry registered under `repository_key` for the field's
    /// SQL type wins when, for a parameterized field, its precision matches.
    /// Otherwise the built-in mapping is used, clamped to this driver's
    /// limits.
    fn get_type(
        &self,
        field: &FieldDef,
        repository_key: Option<&str>,
        repository: Option<&dyn FieldsRepository>,
    ) -> Result<String> {
        if let (Some(key), Some(repository)) = (repository_key, repository) {
            let entry = repository
                .field_defs(key, field.sql_type)
                .into_iter()
                .find(|entry| {
                    entry.sql_type == field.sql_type
                        && (!field.has_params || entry.precision == field.precision)
                });
            if let Some(entry) = entry {
                if entry.native_type.contains('(') {
                    return Ok(entry.native_type);
                }
                return Ok(match entry.precision {
                    Some(p) => format!("{}{}", entry.native_type, format_range(p, entry.scale)),
                    None => entry.native_type,
                });
            }
        }
        self.default_type(field)
    }

    /// Built-in DDL type of `field`, ignoring any repository.
    fn default_type(&self, field: &FieldDef) -> Result<String> {
        let t = field.sql_type;
        let base = self.type_mapping(t);
        if !self.is_sized(t) {
            return Ok(base.to_string());
        }
        if is_decimal(t) {
            let Some(precision) = field.precision else {
                return Ok(base.to_string());
            };
            let precision = precision.min(self.max_precision()?);
            let scale = match field.scale {
                Some(scale) => Some(scale.min(self.max_scale()?).min(precision)),
                None => None,
            };
            return Ok(format!("{base}{}", format_range(precision, scale)));
        }
        let (max, fallback) = if is_fixed_char(t) || t == SqlType::Binary {
            let max = self.max_char_size()?;
            (max, 1)
        } else {
            let max = self.max_varchar_size()?;
            (max, max)
        };
        let size = field.precision.or(field.size).unwrap_or(fallback).clamp(1, max);
        Ok(format!("{base}({size})"))
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    /// Escapes text for use inside a string literal.
    fn filter(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Quotes `value` as a string literal, truncating it to
    /// [`Driver::max_string_literal_size`]. The source text is cut between
    /// characters, before escaping, so an escape sequence is never split.
    fn convert_string_for_storage(&self, value: &str) -> Result<String> {
        let escaped = self.filter(value);
        let max = self.max_string_literal_size()? as usize;
        if escaped.chars().count() + 2 <= max {
            return Ok(format!("'{escaped}'"));
        }
        let budget = max.saturating_sub(2);
        let mut content = String::new();
        let mut used = 0;
        for c in value.chars() {
            let piece = self.filter(c.encode_utf8(&mut [0; 4]));
            let len = piece.chars().count();
            if used + len > budget {
                break;
            }
            used += len;
            content.push_str(&piece);
        }
        Ok(format!("'{content}'"))
    }

    /// Boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    /// Date literal from `YYYY-MM-DD` text.
    fn date_literal(&self, text: &str) -> String {
        format!("DATE '{text}'")
    }

    /// Time literal from `HH:MM:SS` text.
    fn time_literal(&self, text: &str) -> String {
        format!("TIME '{text}'")
    }

    /// Timestamp literal from `YYYY-MM-DD HH:MM:SS[.ffffff]` text.
    fn timestamp_literal(&self, text: &str) -> String {
        format!("TIMESTAMP '{text}'")
    }

    /// Binary literal.
    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    /// Renders a value as a SQL literal for a column of type `sql_type`.
    ///
    /// `from_table` marks text read back from a table scan: numeric and
    /// temporal text is then trusted and emitted as is, instead of being
    /// validated first.
    fn convert_value_for_storage(
        &self,
        value: &Value,
        sql_type: SqlType,
        from_table: bool,
    ) -> Result<String> {
        let literal = match value {
            Value::Null => "NULL".to_string(),
            Value::Text(text) => return self.convert_text_for_storage(text, sql_type, from_table),
            other if is_char(sql_type) => self.convert_string_for_storage(&other.to_string())?,
            Value::Bool(b) => self.boolean_literal(*b).to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(x) if x.is_finite() => x.to_string(),
            Value::Float(x) => self.convert_string_for_storage(&x.to_string())?,
            Value::Bytes(bytes) => self.binary_literal(bytes),
            Value::Date(d) => self.date_literal(&d.format(DEFAULT_DATE_FORMAT).to_string()),
            Value::Time(t) => self.time_literal(&t.format(DEFAULT_TIME_FORMAT).to_string()),
            Value::Timestamp(ts) => {
                self.timestamp_literal(&ts.format(LITERAL_TIMESTAMP_FORMAT).to_string())
            }
        };
        Ok(literal)
    }

    /// Text-valued half of [`Driver::convert_value_for_storage`].
    fn convert_text_for_storage(
        &self,
        text: &str,
        sql_type: SqlType,
        from_table: bool,
    ) -> Result<String> {
        let trimmed = text.trim();
        if is_number(sql_type) {
            if trimmed.is_empty() {
                return Ok("NULL".to_string());
            }
            // NaN and infinities are not SQL number tokens.
            if trimmed.parse::<f64>().map_or(from_table, f64::is_finite) {
                return Ok(trimmed.to_string());
            }
        }
        if is_boolean(sql_type) {
            if let Some(b) = parse_bool(trimmed) {
                return Ok(self.boolean_literal(b).to_string());
            }
        }
        if is_date(sql_type) && !trimmed.is_empty() {
            let normalized = if from_table {
                Some(self.filter(trimmed))
            } else {
                normalize_temporal(trimmed, sql_type)
            };
            if let Some(text) = normalized {
                return Ok(match sql_type {
                    SqlType::Date => self.date_literal(&text),
                    SqlType::Time => self.time_literal(&text),
                    _ => self.timestamp_literal(&text),
                });
            }
        }
        if is_binary(sql_type) {
            if let Ok(bytes) = hex::decode(trimmed) {
                return Ok(self.binary_literal(&bytes));
            }
        }
        self.convert_string_for_storage(text)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `insert into T(\nf1,\nf2\n) values (\nv1,\nv2\n);\n`
    fn insert_statement(&self, fields: &IndexMap<String, String>, table: &str) -> String {
        insert_body(fields, table).map_or_else(String::new, |body| body + ";\n")
    }

    /// `update T\nset f1=v1\n,f2=v2\nwhere k1=v1 and k2=v2;\n`
    fn update_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        let Some(keys) = statement_keys(fields, key_fields) else {
            return String::new();
        };
        let Some(predicate) = key_predicate(fields, &keys) else {
            return String::new();
        };
        let sets: Vec<String> = non_key_fields(fields, &keys)
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if sets.is_empty() {
            return String::new();
        }
        format!("update {table}\nset {}\nwhere {predicate};\n", sets.join("\n,"))
    }

    /// `delete from T\nwhere k1=v1;\n`
    fn delete_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        let Some(keys) = statement_keys(fields, key_fields) else {
            return String::new();
        };
        key_predicate(fields, &keys).map_or_else(String::new, |predicate| {
            format!("delete from {table}\nwhere {predicate};\n")
        })
    }

    /// Insert-or-update of one row.
    fn merge_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        conditional_merge(self, fields, table, key_fields)
    }

    /// Opens a conditional, before the condition.
    fn if_(&self) -> &'static str {
        "if "
    }

    /// Between the condition and the `then` branch.
    fn if_begin(&self) -> &'static str {
        " then\n"
    }

    /// Between the branches.
    fn if_else(&self) -> &'static str {
        "else\n"
    }

    /// Closes a conditional.
    fn if_end(&self) -> &'static str {
        "end if;\n"
    }

    /// `create table` for the visible fields of `ds`.
    fn create_table_statement(
        &self,
        ds: &DataSet,
        repository: Option<&dyn FieldsRepository>,
    ) -> Result<String> {
        let mut columns = Vec::new();
        for field in ds.fields().iter().filter(|f| f.visible && !f.to_delete) {
            let native = self.get_type(field, Some(ds.table_name()), repository)?;
            let null = if field.nullable { "" } else { " not null" };
            columns.push(format!("  {} {native}{null}", field.name));
        }
        if columns.is_empty() {
            return Ok(String::new());
        }
        if let Some(keys) = ds.key_fields() {
            let keys = key_list(keys);
            if !keys.is_empty() {
                columns.push(format!("  primary key ({})", keys.join(", ")));
            }
        }
        Ok(format!(
            "create table {}(\n{}\n);\n",
            ds.table_name(),
            columns.join(",\n")
        ))
    }

    // ------------------------------------------------------------------
    // Procedural blocks
    // ------------------------------------------------------------------

    /// Whether the dialect has procedural blocks and cursors.
    fn supports_procedural(&self) -> bool {
        true
    }

    /// Opens a block.
    fn begin(&self) -> &'static str {
        "begin\n"
    }

    /// Closes a block.
    fn end(&self) -> &'static str {
        "end;\n"
    }

    /// Starts the exception handler of a block.
    fn on_exception_begin(&self) -> &'static str {
        "exception\nwhen others then\n"
    }

    /// Ends the exception handler of a block.
    fn on_exception_end(&self) -> &'static str {
        ""
    }

    /// A block running `body`, with `handler` run on any error.
    fn guarded_block(&self, body: &str, handler: &str) -> String {
        format!(
            "{}{body}{}{handler}{}{}",
            self.begin(),
            self.on_exception_begin(),
            self.on_exception_end(),
            self.end()
        )
    }

    /// Name of a procedural variable.
    fn cursor_var_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Comma-separated procedural variable names.
    fn cursor_vars(&self, vars: &[&str]) -> String {
        vars.iter()
            .map(|v| self.cursor_var_name(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Declares a cursor over `select`.
    fn declare_cursor_sql(&self, cursor: &str, select: &str) -> String {
        format!("cursor {cursor} is\n{select};\n")
    }

    /// Opens the cursor and starts a loop over its rows, fetching each row
    /// into `vars`.
    fn cursor_loop_start_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!(
            "open {cursor};\nloop\nfetch {cursor} into {};\nexit when {cursor}%notfound;\n",
            self.cursor_vars(vars)
        )
    }

    /// Ends the loop and closes the cursor.
    fn cursor_loop_end_sql(&self, cursor: &str, _vars: &[&str]) -> String {
        format!("end loop;\nclose {cursor};\n")
    }

    /// Fetches the next row into `vars`.
    fn fetch_next_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!("fetch {cursor} into {};\n", self.cursor_vars(vars))
    }

    /// Name of a temporary table.
    fn temp_table_name(&self, name: &str, _global: bool) -> String {
        name.to_string()
    }
}

/// Parses temporal text with the default formats and renders it the way
/// literals expect. `None` when the text does not parse.
fn normalize_temporal(text: &str, sql_type: SqlType) -> Option<String> {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    match sql_type {
        SqlType::Date => NaiveDate::parse_from_str(text, DEFAULT_DATE_FORMAT)
            .ok()
            .map(|d| d.format(DEFAULT_DATE_FORMAT).to_string()),
        SqlType::Time => NaiveTime::parse_from_str(text, DEFAULT_TIME_FORMAT)
            .ok()
            .map(|t| t.format(DEFAULT_TIME_FORMAT).to_string()),
        _ => NaiveDateTime::parse_from_str(text, DEFAULT_TIMESTAMP_FORMAT)
            .ok()
            .map(|ts| ts.format(LITERAL_TIMESTAMP_FORMAT).to_string()),
    }
}

/// Looks a driver up by name. Accepts common aliases such as `mssql` and
/// `postgresql`.
pub fn by_name(name: &str) -> Result<Arc<dyn Driver>> {
    let driver: Arc<dyn Driver> = match name.trim().to_ascii_lowercase().as_str() {
        "generic" | "ansi" => Arc::new(GenericDriver::new()),
        "oracle" => Arc::new(OracleDriver),
        "sqlserver" | "mssql" => Arc::new(SqlServerDriver),
        "postgres" | "postgresql" => Arc::new(PostgresDriver),
        "mysql" | "mariadb" => Arc::new(MySqlDriver),
        "sqlite" => Arc::new(SqliteDriver),
        _ => return Err(EtlError::UnknownDriver(name.to_string())),
    };
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_insert_statement() {
        let driver = GenericDriver::new();
        let f = fields(&[("field1", "123"), ("field2", "'abc'")]);
        assert_eq!(
            driver.insert_statement(&f, "test"),
            "insert into test(\nfield1,\nfield2\n) values (\n123,\n'abc'\n);\n"
        );
        assert_eq!(driver.insert_statement(&IndexMap::new(), "test"), "");
    }

    #[test]
    fn test_update_statement() {
        let driver = GenericDriver::new();
        let f = fields(&[
            ("field1", "123"),
            ("field2", "'abc'"),
            ("field3", "sysdate"),
            ("field4", "17"),
        ]);
        assert_eq!(
            driver.update_statement(&f, "test", "field2, field3"),
            "update test\nset field1=123\n,field4=17\nwhere field2='abc' and field3=sysdate;\n"
        );
        assert_eq!(driver.update_statement(&f, "test", ""), "");
        assert_eq!(driver.update_statement(&f, "test", "missing"), "");
        assert_eq!(
            driver.update_statement(&fields(&[("id", "1")]), "test", "id"),
            ""
        );
    }

    #[test]
    fn test_delete_statement() {
        let driver = GenericDriver::new();
        let f = fields(&[("id", "1"), ("name", "'x'")]);
        assert_eq!(
            driver.delete_statement(&f, "t", "id"),
            "delete from t\nwhere id=1;\n"
        );
        assert_eq!(driver.delete_statement(&f, "t", " "), "");
        assert_eq!(driver.delete_statement(&IndexMap::new(), "t", "id"), "");
    }

    #[test]
    fn test_generic_merge_statement() {
        let driver = GenericDriver::new();
        let f = fields(&[("id", "1"), ("name", "'x'")]);
        assert_eq!(
            driver.merge_statement(&f, "t", "id"),
            "if (not exists (select 1 from t where id=1)) then\n\
             insert into t(\nid,\nname\n) values (\n1,\n'x'\n);\n\
             else\n\
             update t\nset name='x'\nwhere id=1;\n\
             end if;\n"
        );

        let only_key = fields(&[("id", "1")]);
        assert_eq!(
            driver.merge_statement(&only_key, "t", "id"),
            "if (not exists (select 1 from t where id=1)) then\n\
             insert into t(\nid\n) values (\n1\n);\n\
             end if;\n"
        );
        assert_eq!(driver.merge_statement(&f, "t", ""), "");
    }

    #[test]
    fn test_limits_require_configuration() {
        let driver = GenericDriver::new();
        assert!(matches!(
            driver.max_varchar_size(),
            Err(EtlError::UnconfiguredLimit { limit: "max varchar size", .. })
        ));
        assert!(driver.convert_string_for_storage("x").is_err());
    }

    #[test]
    fn test_limits_walk_parent_chain() {
        let mut middle = GenericDriver::new();
        middle.set_parent_driver_name("oracle").unwrap();
        let child = GenericDriver::with_limits(DriverLimits {
            max_char_size: Some(10),
            ..DriverLimits::default()
        })
        .with_parent(Arc::new(middle));

        assert_eq!(child.max_char_size().unwrap(), 10);
        assert_eq!(child.max_varchar_size().unwrap(), 4000);
        assert_eq!(child.max_scale().unwrap(), 127);
    }

    #[test]
    fn test_convert_string_for_storage_truncates() {
        let driver = GenericDriver::with_limits(DriverLimits {
            max_string_literal_size: Some(6),
            ..DriverLimits::default()
        });
        assert_eq!(driver.convert_string_for_storage("abcd").unwrap(), "'abcd'");
        assert_eq!(driver.convert_string_for_storage("abcdef").unwrap(), "'abcd'");
        // Never leaves half of an escaped quote behind.
        assert_eq!(driver.convert_string_for_storage("abc'd").unwrap(), "'abc'");
        assert_eq!(driver.convert_string_for_storage("it's").unwrap(), "'it'''");
    }

    #[test]
    fn test_convert_value_for_storage() {
        let driver = GenericDriver::with_limits(DriverLimits::declared(10, 100, 38, 10, 100));
        let lit = |v: Value, t: SqlType| driver.convert_value_for_storage(&v, t, false).unwrap();

        assert_eq!(lit(Value::Null, SqlType::Varchar), "NULL");
        assert_eq!(lit(Value::Int(5), SqlType::Integer), "5");
        assert_eq!(lit(Value::Int(5), SqlType::Varchar), "'5'");
        assert_eq!(lit(Value::Text("O'Hara".into()), SqlType::Varchar), "'O''Hara'");
        assert_eq!(lit(Value::Text(" 12.5 ".into()), SqlType::Numeric), "12.5");
        assert_eq!(lit(Value::Text("n/a".into()), SqlType::Integer), "'n/a'");
        assert_eq!(lit(Value::Text("".into()), SqlType::Integer), "NULL");
        assert_eq!(lit(Value::Text("2024-01-02".into()), SqlType::Date), "DATE '2024-01-02'");
        assert_eq!(lit(Value::Text("soon".into()), SqlType::Date), "'soon'");
        assert_eq!(lit(Value::Bytes(vec![1, 0xff]), SqlType::Blob), "X'01FF'");
        assert_eq!(lit(Value::Bool(true), SqlType::Boolean), "true");
        assert_eq!(lit(Value::Text("yes".into()), SqlType::Boolean), "true");
    }

    #[test]
    fn test_non_finite_numbers_are_quoted() {
        let driver = GenericDriver::with_limits(DriverLimits::declared(10, 100, 38, 10, 100));
        for text in ["NaN", "inf", "-Infinity", "1e999"] {
            for from_table in [false, true] {
                let literal = driver
                    .convert_text_for_storage(text, SqlType::Numeric, from_table)
                    .unwrap();
                assert_eq!(literal, format!("'{text}'"));
            }
        }
        let lit = |x: f64| {
            driver
                .convert_value_for_storage(&Value::Float(x), SqlType::Double, false)
                .unwrap()
        };
        assert_eq!(lit(f64::NAN), "'NaN'");
        assert_eq!(lit(f64::INFINITY), "'inf'");
        assert_eq!(lit(-2.5), "-2.5");
    }

    #[test]
    fn test_from_table_text_is_trusted() {
        let driver = GenericDriver::with_limits(DriverLimits::declared(10, 100, 38, 10, 100));
        assert_eq!(
            driver
                .convert_value_for_storage(&Value::Text("02-JAN-24".into()), SqlType::Date, true)
                .unwrap(),
            "DATE '02-JAN-24'"
        );
        assert_eq!(
            driver
                .convert_value_for_storage(&Value::Text("1,5".into()), SqlType::Numeric, true)
                .unwrap(),
            "1,5"
        );
        assert_eq!(
            driver
                .convert_value_for_storage(&Value::Text("x' or '1".into()), SqlType::Date, true)
                .unwrap(),
            "DATE 'x'' or ''1'"
        );
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("MSSQL").unwrap().name(), "sqlserver");
        assert_eq!(by_name("postgresql").unwrap().name(), "postgres");
        assert!(matches!(by_name("db2"), Err(EtlError::UnknownDriver(_))));
    }

    #[test]
    fn test_cursor_loop_defaults() {
        let driver = GenericDriver::new();
        assert_eq!(
            driver.cursor_loop_start_sql("c1", &["a", "b"]),
            "open c1;\nloop\nfetch c1 into a, b;\nexit when c1%notfound;\n"
        );
        assert_eq!(driver.cursor_loop_end_sql("c1", &[]), "end loop;\nclose c1;\n");
        assert_eq!(
            driver.guarded_block("x := 1;\n", "null;\n"),
            "begin\nx := 1;\nexception\nwhen others then\nnull;\nend;\n"
        );
    }
}
