//! SQL Server driver.

use crate::types::SqlType;

use super::{Driver, DriverLimits};

const LIMITS: DriverLimits = DriverLimits::declared(8000, 8000, 38, 38, 8000);

/// SQL Server dialect: T-SQL blocks, `@` variables and `#` temp tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDriver;

impl Driver for SqlServerDriver {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn limits(&self) -> &DriverLimits {
        &LIMITS
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit | SqlType::Boolean => "BIT",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INT",
            SqlType::BigInt => "BIGINT",
            SqlType::Float | SqlType::Double => "FLOAT",
            SqlType::Real => "REAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Decimal => "DECIMAL",
            SqlType::Char => "CHAR",
            SqlType::NChar => "NCHAR",
            SqlType::Varchar => "VARCHAR",
            SqlType::NVarchar => "NVARCHAR",
            SqlType::LongVarchar | SqlType::Clob | SqlType::Other | SqlType::Null => {
                "VARCHAR(MAX)"
            }
            SqlType::LongNVarchar | SqlType::NClob => "NVARCHAR(MAX)",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "DATETIME2",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::LongVarBinary | SqlType::Blob => "VARBINARY(MAX)",
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
        format!("convert(date,'{text}',23)")
    }

    fn time_literal(&self, text: &str) -> String {
        format!("convert(time,'{text}',108)")
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("convert(datetime2,'{text}',121)")
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex::encode_upper(bytes))
    }

    fn if_begin(&self) -> &'static str {
        "\nbegin\n"
    }

    fn if_else(&self) -> &'static str {
        "end\nelse\nbegin\n"
    }

    fn if_end(&self) -> &'static str {
        "end\n"
    }

    fn begin(&self) -> &'static str {
        "BEGIN\n"
    }

    fn end(&self) -> &'static str {
        "END\n"
    }

    fn on_exception_begin(&self) -> &'static str {
        "END TRY\nBEGIN CATCH\n"
    }

    fn on_exception_end(&self) -> &'static str {
        "END CATCH\n"
    }

    fn guarded_block(&self, body: &str, handler: &str) -> String {
        format!("BEGIN TRY\n{body}END TRY\nBEGIN CATCH\n{handler}END CATCH\n")
    }

    fn cursor_var_name(&self, name: &str) -> String {
        format!("@{name}")
    }

    fn declare_cursor_sql(&self, cursor: &str, select: &str) -> String {
        format!("DECLARE {cursor} CURSOR FOR\n{select}\n")
    }

    fn cursor_loop_start_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!(
            "OPEN {cursor}\nFETCH NEXT FROM {cursor} INTO {}\nWHILE @@FETCH_STATUS = 0\nBEGIN\n",
            self.cursor_vars(vars)
        )
    }

    fn cursor_loop_end_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!(
            "FETCH NEXT FROM {cursor} INTO {}\nEND\nCLOSE {cursor}\nDEALLOCATE {cursor}\n",
            self.cursor_vars(vars)
        )
    }

    fn fetch_next_sql(&self, cursor: &str, vars: &[&str]) -> String {
        format!("FETCH NEXT FROM {cursor} INTO {}\n", self.cursor_vars(vars))
    }

    fn temp_table_name(&self, name: &str, global: bool) -> String {
        if global {
            format!("##{name}")
        } else {
            format!("#{name}")
        }
    }
}
