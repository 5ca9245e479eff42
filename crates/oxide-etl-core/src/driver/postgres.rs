//! PostgreSQL driver.

use indexmap::IndexMap;

use crate::types::SqlType;

use super::{conditional_merge, Driver, DriverLimits};

const LIMITS: DriverLimits = DriverLimits::declared(10_485_760, 10_485_760, 1000, 1000, 10_485_760);

/// PostgreSQL dialect: PL/pgSQL blocks and `bytea` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn limits(&self) -> &DriverLimits {
        &LIMITS
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit | SqlType::Boolean => "boolean",
            SqlType::TinyInt | SqlType::SmallInt => "smallint",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Float | SqlType::Double => "double precision",
            SqlType::Real => "real",
            SqlType::Numeric | SqlType::Decimal => "numeric",
            SqlType::Char | SqlType::NChar => "char",
            SqlType::Varchar | SqlType::NVarchar => "varchar",
            SqlType::LongVarchar
            | SqlType::LongNVarchar
            | SqlType::Clob
            | SqlType::NClob
            | SqlType::Other
            | SqlType::Null => "text",
            SqlType::Date => "date",
            SqlType::Time => "time",
            SqlType::Timestamp => "timestamp",
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob => {
                "bytea"
            }
        }
    }

    fn is_sized(&self, sql_type: SqlType) -> bool {
        matches!(
            sql_type,
            SqlType::Char
                | SqlType::NChar
                | SqlType::Varchar
                | SqlType::NVarchar
                | SqlType::Numeric
                | SqlType::Decimal
        )
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", hex::encode(bytes))
    }

    fn merge_statement(
        &self,
        fields: &IndexMap<String, String>,
        table: &str,
        key_fields: &str,
    ) -> String {
        let merge = conditional_merge(self, fields, table, key_fields);
        if merge.is_empty() {
            return merge;
        }
        format!("do $$\nbegin\n{merge}end $$;\n")
    }

    fn declare_cursor_sql(&self, cursor: &str, select: &str) -> String {
        format!("{cursor} cursor for\n{select};\n")
    }

    fn cursor_loop_start_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!(
            "open {cursor};\nloop\nfetch {cursor} into {};\nexit when not found;\n",
            self.cursor_vars(vars)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDef;
    use crate::value::Value;

    #[test]
    fn test_types() {
        let driver = PostgresDriver;
        let ty = |f: FieldDef| driver.get_type(&f, None, None).unwrap();
        assert_eq!(ty(FieldDef::new("a", SqlType::Double)), "double precision");
        assert_eq!(ty(FieldDef::new("a", SqlType::VarBinary).size(16)), "bytea");
        assert_eq!(ty(FieldDef::new("a", SqlType::Varchar).size(16)), "varchar(16)");
        assert_eq!(ty(FieldDef::new("a", SqlType::Clob)), "text");
    }

    #[test]
    fn test_binary_literal() {
        assert_eq!(
            PostgresDriver
                .convert_value_for_storage(&Value::Bytes(vec![0xde, 0xad]), SqlType::Blob, false)
                .unwrap(),
            "'\\xdead'::bytea"
        );
    }

    #[test]
    fn test_merge_wraps_anonymous_block() {
        let fields: IndexMap<String, String> = [("id", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            PostgresDriver.merge_statement(&fields, "t", "id"),
            "do $$\nbegin\nif (not exists (select 1 from t where id=1)) then\n\
             insert into t(\nid\n) values (\n1\n);\n\
             end if;\nend $$;\n"
        );
        assert_eq!(PostgresDriver.merge_statement(&fields, "t", ""), "");
    }

    #[test]
    fn test_cursor_loop() {
        assert_eq!(
            PostgresDriver.cursor_loop_start_sql("c", &["a"]),
            "open c;\nloop\nfetch c into a;\nexit when not found;\n"
        );
    }
}
