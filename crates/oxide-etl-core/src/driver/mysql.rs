//! MySQL driver.

use indexmap::IndexMap;

use crate::types::SqlType;

use super::{insert_body, key_list, key_predicate, non_key_fields, Driver, DriverLimits};

const LIMITS: DriverLimits = DriverLimits::declared(255, 65_535, 65, 30, 65_535);

/// MySQL and MariaDB dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl Driver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn limits(&self) -> &DriverLimits {
        &LIMITS
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit | SqlType::Boolean => "BOOLEAN",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INT",
            SqlType::BigInt => "BIGINT",
            SqlType::Float | SqlType::Double => "DOUBLE",
            SqlType::Real => "FLOAT",
            SqlType::Numeric | SqlType::Decimal => "DECIMAL",
            SqlType::Char | SqlType::NChar => "CHAR",
            SqlType::Varchar | SqlType::NVarchar => "VARCHAR",
            SqlType::LongVarchar
            | SqlType::LongNVarchar
            | SqlType::Clob
            | SqlType::NClob
            | SqlType::Other
            | SqlType::Null => "LONGTEXT",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "DATETIME",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::LongVarBinary | SqlType::Blob => "LONGBLOB",
        }
    }

    /// Backslash is an escape character inside MySQL string literals.
    fn filter(&self, value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "''")
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
        let mut sets: Vec<String> = non_key_fields(fields, &keys)
            .into_iter()
            .map(|(f, v)| format!("{f}={v}"))
            .collect();
        if sets.is_empty() {
            sets.push(format!("{0}={0}", keys[0]));
        }
        format!("{insert}\non duplicate key update {};\n", sets.join("\n,"))
    }

    fn on_exception_begin(&self) -> &'static str {
        "declare exit handler for sqlexception\nbegin\n"
    }

    fn on_exception_end(&self) -> &'static str {
        "end;\n"
    }

    /// MySQL declares handlers before the statements they guard.
    fn guarded_block(&self, body: &str, handler: &str) -> String {
        format!(
            "begin\ndeclare exit handler for sqlexception\nbegin\n{handler}end;\n{body}end;\n"
        )
    }

    fn declare_cursor_sql(&self, cursor: &str, select: &str) -> String {
        format!(
            "declare {cursor}_done int default 0;\n\
             declare {cursor} cursor for\n{select};\n\
             declare continue handler for not found set {cursor}_done = 1;\n"
        )
    }

    fn cursor_loop_start_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!(
            "open {cursor};\n{cursor}_loop: loop\nfetch {cursor} into {};\n\
             if {cursor}_done = 1 then\nleave {cursor}_loop;\nend if;\n",
            self.cursor_vars(vars)
        )
    }

    fn cursor_loop_end_sql(&self, cursor: &str, _vars: &[&str]) -> String {
        format!("end loop {cursor}_loop;\nclose {cursor};\n")
    }
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
    fn test_filter_escapes_backslash() {
        assert_eq!(
            MySqlDriver.convert_string_for_storage("a\\b'c").unwrap(),
            "'a\\\\b''c'"
        );
    }

    #[test]
    fn test_truncation_keeps_backslash_pairs() {
        for prefix in ["a", "aa"] {
            let value = format!("{prefix}{}", "\\".repeat(40_000));
            let literal = MySqlDriver.convert_string_for_storage(&value).unwrap();
            assert!(literal.len() <= 65_535);
            let body = &literal[1..literal.len() - 1];
            let trailing = body.chars().rev().take_while(|c| *c == '\\').count();
            assert_eq!(trailing % 2, 0, "{prefix}");
            assert!(literal.ends_with("\\\\'"));
        }
    }

    #[test]
    fn test_merge_on_duplicate_key() {
        let f = fields(&[("id", "1"), ("name", "'x'"), ("qty", "3")]);
        assert_eq!(
            MySqlDriver.merge_statement(&f, "t", "id"),
            "insert into t(\nid,\nname,\nqty\n) values (\n1,\n'x',\n3\n)\n\
             on duplicate key update name='x'\n,qty=3;\n"
        );
        let only_key = fields(&[("id", "1")]);
        assert!(MySqlDriver
            .merge_statement(&only_key, "t", "id")
            .ends_with("on duplicate key update id=id;\n"));
        assert_eq!(MySqlDriver.merge_statement(&f, "t", "missing"), "");
    }

    #[test]
    fn test_cursor_loop_uses_handler() {
        let driver = MySqlDriver;
        assert!(driver
            .declare_cursor_sql("c", "select a from t")
            .contains("declare continue handler for not found set c_done = 1;"));
        assert_eq!(
            driver.cursor_loop_start_sql("c", &["a"]),
            "open c;\nc_loop: loop\nfetch c into a;\nif c_done = 1 then\nleave c_loop;\nend if;\n"
        );
        assert_eq!(driver.cursor_loop_end_sql("c", &["a"]), "end loop c_loop;\nclose c;\n");
    }
}
