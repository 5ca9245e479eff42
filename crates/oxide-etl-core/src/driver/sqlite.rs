//! SQLite driver.
//!
//! SQLite has type affinities instead of sized types and no procedural
//! language, so sizes are never emitted and the procedural fragments are
//! empty.

use indexmap::IndexMap;

use crate::types::SqlType;

use super::{insert_body, key_list, key_predicate, non_key_fields, Driver, DriverLimits};

const LIMITS: DriverLimits =
    DriverLimits::declared(1_000_000_000, 1_000_000_000, 38, 38, 1_000_000_000);

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn limits(&self) -> &DriverLimits {
        &LIMITS
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit
            | SqlType::Boolean
            | SqlType::TinyInt
            | SqlType::SmallInt
            | SqlType::Integer
            | SqlType::BigInt => "INTEGER",
            SqlType::Float | SqlType::Real | SqlType::Double => "REAL",
            SqlType::Numeric | SqlType::Decimal => "NUMERIC",
            SqlType::Char
            | SqlType::NChar
            | SqlType::Varchar
            | SqlType::NVarchar
            | SqlType::LongVarchar
            | SqlType::LongNVarchar
            | SqlType::Clob
            | SqlType::NClob
            | SqlType::Date
            | SqlType::Time
            | SqlType::Timestamp
            | SqlType::Other
            | SqlType::Null => "TEXT",
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob => {
                "BLOB"
            }
        }
    }

    fn is_sized(&self, _sql_type: SqlType) -> bool {
        false
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn date_literal(&self, text: &str) -> String {
        format!("'{text}'")
    }

    fn time_literal(&self, text: &str) -> String {
        format!("'{text}'")
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("'{text}'")
    }

    fn merge_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        let keys = key_list(key_fields);
        if keys.is_empty() || key_predicate(fields, &keys).is_none() {
            return String::new();
        }
        let Some(insert) = insert_body(fields, table) else {
            return String::new();
        };
        let sets: Vec<String> = non_key_fields(fields, &keys)
            .into_iter()
            .map(|(f, _)| format!("{f}=excluded.{f}"))
            .collect();
        let conflict = keys.join(", ");
        if sets.is_empty() {
            format!("{insert}\non conflict({conflict}) do nothing;\n")
        } else {
            format!(
                "{insert}\non conflict({conflict}) do update set\n{};\n",
                sets.join("\n,")
            )
        }
    }

    fn supports_procedural(&self) -> bool {
        false
    }

    fn begin(&self) -> &'static str {
        ""
    }

    fn end(&self) -> &'static str {
        ""
    }

    fn on_exception_begin(&self) -> &'static str {
        ""
    }

    fn guarded_block(&self, body: &str, _handler: &str) -> String {
        body.to_string()
    }

    fn declare_cursor_sql(&self, _cursor: &str, _select: &str) -> String {
        String::new()
    }

    fn cursor_loop_start_sql(&self, _cursor: &str, _vars: &[&str]) -> String {
        String::new()
    }

    fn cursor_loop_end_sql(&self, _cursor: &str, _vars: &[&str]) -> String {
        String::new()
    }

    fn fetch_next_sql(&self, _cursor: &str, _vars: &[&str]) -> String {
        String::new()
    }

    fn temp_table_name(&self, name: &str, _global: bool) -> String {
        format!("temp.{name}")
    }
}
