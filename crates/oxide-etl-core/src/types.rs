//! SQL type codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Semantic SQL type of a field, independent of any dialect.
///
/// The numeric codes returned by [`SqlType::code`] match the JDBC
/// `java.sql.Types` constants so that metadata produced by other tools can be
/// mapped losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    // Integer types
    /// Single bit, usually used as a boolean.
    Bit,
    /// 1-byte integer.
    TinyInt,
    /// 2-byte integer.
    SmallInt,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    BigInt,

    // Approximate and exact numerics
    /// Floating point.
    Float,
    /// Single precision floating point.
    Real,
    /// Double precision floating point.
    Double,
    /// Exact numeric with precision and scale.
    Numeric,
    /// Exact decimal with precision and scale.
    Decimal,

    // Character types
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    Varchar,
    /// Long variable-length character string.
    LongVarchar,
    /// Fixed-length national character string.
    NChar,
    /// Variable-length national character string.
    NVarchar,
    /// Long variable-length national character string.
    LongNVarchar,

    // Date/time
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    Timestamp,

    // Binary
    /// Fixed-length binary.
    Binary,
    /// Variable-length binary.
    VarBinary,
    /// Long variable-length binary.
    LongVarBinary,

    // Large objects
    /// Character large object.
    Clob,
    /// National character large object.
    NClob,
    /// Binary large object.
    Blob,

    /// Boolean.
    Boolean,
    /// The SQL NULL type (untyped null).
    Null,
    /// Anything without a dedicated code.
    Other,
}

impl SqlType {
    /// Every type, in declaration order.
    pub const ALL: [Self; 28] = [
        Self::Bit,
        Self::TinyInt,
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Float,
        Self::Real,
        Self::Double,
        Self::Numeric,
        Self::Decimal,
        Self::Char,
        Self::Varchar,
        Self::LongVarchar,
        Self::NChar,
        Self::NVarchar,
        Self::LongNVarchar,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::Binary,
        Self::VarBinary,
        Self::LongVarBinary,
        Self::Clob,
        Self::NClob,
        Self::Blob,
        Self::Boolean,
        Self::Null,
        Self::Other,
    ];

    /// Returns the JDBC type code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Bit => -7,
            Self::TinyInt => -6,
            Self::SmallInt => 5,
            Self::Integer => 4,
            Self::BigInt => -5,
            Self::Float => 6,
            Self::Real => 7,
            Self::Double => 8,
            Self::Numeric => 2,
            Self::Decimal => 3,
            Self::Char => 1,
            Self::Varchar => 12,
            Self::LongVarchar => -1,
            Self::NChar => -15,
            Self::NVarchar => -9,
            Self::LongNVarchar => -16,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
            Self::Binary => -2,
            Self::VarBinary => -3,
            Self::LongVarBinary => -4,
            Self::Clob => 2005,
            Self::NClob => 2011,
            Self::Blob => 2004,
            Self::Boolean => 16,
            Self::Null => 0,
            Self::Other => 1111,
        }
    }

    /// Looks a type up by its JDBC code. Unknown codes map to [`SqlType::Other`].
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .unwrap_or(Self::Other)
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bit => "BIT",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Real => "REAL",
            Self::Double => "DOUBLE",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::LongVarchar => "LONGVARCHAR",
            Self::NChar => "NCHAR",
            Self::NVarchar => "NVARCHAR",
            Self::LongNVarchar => "LONGNVARCHAR",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::LongVarBinary => "LONGVARBINARY",
            Self::Clob => "CLOB",
            Self::NClob => "NCLOB",
            Self::Blob => "BLOB",
            Self::Boolean => "BOOLEAN",
            Self::Null => "NULL",
            Self::Other => "OTHER",
        }
    }

    /// Maps a native type spelling (any dialect, any case, with or without a
    /// `(...)` suffix) to the closest SQL type.
    #[must_use]
    pub fn from_native(native: &str) -> Self {
        let base = native
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        match base.as_str() {
            "BIT" => Self::Bit,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" | "INT2" => Self::SmallInt,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" | "SERIAL" => Self::Integer,
            "BIGINT" | "INT8" | "BIGSERIAL" => Self::BigInt,
            "FLOAT" | "BINARY_FLOAT" => Self::Float,
            "REAL" | "FLOAT4" => Self::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" | "BINARY_DOUBLE" => Self::Double,
            "NUMERIC" | "NUMBER" | "MONEY" => Self::Numeric,
            "DECIMAL" | "DEC" => Self::Decimal,
            "CHAR" | "CHARACTER" | "BPCHAR" => Self::Char,
            "VARCHAR" | "VARCHAR2" | "CHARACTER VARYING" => Self::Varchar,
            "LONGVARCHAR" | "LONG" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => Self::LongVarchar,
            "NCHAR" => Self::NChar,
            "NVARCHAR" | "NVARCHAR2" => Self::NVarchar,
            "LONGNVARCHAR" | "NTEXT" => Self::LongNVarchar,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" | "DATETIME" | "DATETIME2" | "SMALLDATETIME" => Self::Timestamp,
            "BINARY" => Self::Binary,
            "VARBINARY" | "RAW" => Self::VarBinary,
            "LONGVARBINARY" | "LONG RAW" | "IMAGE" | "BYTEA" => Self::LongVarBinary,
            "CLOB" => Self::Clob,
            "NCLOB" => Self::NClob,
            "BLOB" | "LONGBLOB" | "MEDIUMBLOB" => Self::Blob,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "NULL" => Self::Null,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
