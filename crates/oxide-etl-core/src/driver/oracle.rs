//! Oracle driver.

use indexmap::IndexMap;

use crate::types::SqlType;

use super::{key_list, non_key_fields, Driver, DriverLimits};

const LIMITS: DriverLimits = DriverLimits::declared(2000, 4000, 38, 127, 4000);

/// Oracle dialect: `VARCHAR2`, `NUMBER`, PL/SQL blocks and native `MERGE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDriver;

impl Driver for OracleDriver {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn limits(&self) -> &DriverLimits {
        &LIMITS
    }

    /// Oracle reports `NUMBER` columns declared without a scale as scale
    /// -127.
    fn wrong_scale(&self) -> Option<i32> {
        Some(-127)
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit | SqlType::Boolean => "NUMBER(1)",
            SqlType::TinyInt => "NUMBER(3)",
            SqlType::SmallInt => "NUMBER(5)",
            SqlType::Integer => "NUMBER(10)",
            SqlType::BigInt => "NUMBER(19)",
            SqlType::Float | SqlType::Double => "BINARY_DOUBLE",
            SqlType::Real => "BINARY_FLOAT",
            SqlType::Numeric | SqlType::Decimal => "NUMBER",
            SqlType::Char => "CHAR",
            SqlType::NChar => "NCHAR",
            SqlType::Varchar => "VARCHAR2",
            SqlType::NVarchar => "NVARCHAR2",
            SqlType::LongVarchar | SqlType::Clob | SqlType::Other | SqlType::Null => "CLOB",
            SqlType::LongNVarchar | SqlType::NClob => "NCLOB",
            SqlType::Date | SqlType::Time => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Binary | SqlType::VarBinary => "RAW",
            SqlType::LongVarBinary | SqlType::Blob => "BLOB",
        }
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn date_literal(&self, text: &str) -> String {
        format!("to_date('{text}','YYYY-MM-DD')")
    }

    /// Oracle `DATE` has no fractional seconds.
    fn time_literal(&self, text: &str) -> String {
        let seconds = text.split_once('.').map_or(text, |(whole, _)| whole);
        format!("to_date('{seconds}','HH24:MI:SS')")
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("to_timestamp('{text}','YYYY-MM-DD HH24:MI:SS.FF')")
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("hextoraw('{}')", hex::encode_upper(bytes))
    }

    fn merge_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        let keys = key_list(key_fields);
        if fields.is_empty()
            || keys.is_empty()
            || !keys
                .iter()
                .all(|k| fields.keys().any(|f| f.eq_ignore_ascii_case(k)))
        {
            return String::new();
        }

        let source: Vec<String> = fields.iter().map(|(f, v)| format!("{v} {f}")).collect();
        let on: Vec<String> = keys.iter().map(|k| format!("t.{k} = s.{k}")).collect();
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        let values: Vec<String> = names.iter().map(|f| format!("s.{f}")).collect();

        let mut sql = format!(
            "merge into {table} t\nusing (select {} from dual) s\non ({})\n",
            source.join(", "),
            on.join(" and ")
        );
        let sets: Vec<String> = non_key_fields(fields, &keys)
            .into_iter()
            .map(|(f, _)| format!("t.{f} = s.{f}"))
            .collect();
        if !sets.is_empty() {
            sql.push_str(&format!("when matched then update set {}\n", sets.join(", ")));
        }
        sql.push_str(&format!(
            "when not matched then insert ({}) values ({});\n",
            names.join(", "),
            values.join(", ")
        ));
        sql
    }
}
