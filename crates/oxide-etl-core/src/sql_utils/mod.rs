//! Stateless SQL type and text utilities.
//!
//! Everything here is a pure function and safe to call from any thread.
//!
//! - Type classification predicates (`is_char`, `is_decimal`, ...)
//! - Size suffix parsing and rendering ([`type_range`], [`scale_and_precision`])
//! - Cross-dialect type translation ([`convert_data_type`])
//! - Type inference for untyped text ([`type_and_value`], [`field_type`],
//!   [`is_compatible`])
//! - Qualified identifier parsing ([`QualifiedName`])
//! - Result set population ([`populate_data_set`])
//! - Script splitting ([`split_statements`], [`strip_comments`])

mod infer;
mod names;
mod populate;
mod statements;
mod type_range;

pub use infer::{field_type, is_compatible, type_and_value};
pub use names::{
    base_name_to_name, full_name_to_base_name, full_name_to_name, full_name_to_node_name,
    full_name_to_owner_name, QualifiedName,
};
pub use populate::{populate_data_set, ColumnMeta, PopulateOptions, ResultSet, VecResultSet};
pub use statements::{split_statements, strip_comments};
pub use type_range::{convert_data_type, format_range, scale_and_precision, type_range};

use crate::types::SqlType;

/// Character types, including the long and national variants.
#[must_use]
pub const fn is_char(sql_type: SqlType) -> bool {
    matches!(
        sql_type,
        SqlType::Char
            | SqlType::Varchar
            | SqlType::LongVarchar
            | SqlType::NChar
            | SqlType::NVarchar
            | SqlType::LongNVarchar
    )
}

/// Fixed-length character types.
#[must_use]
pub const fn is_fixed_char(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Char | SqlType::NChar)
}

/// Long character types that carry no length suffix.
#[must_use]
pub const fn is_long_char(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::LongVarchar | SqlType::LongNVarchar)
}

/// Exact numerics with precision and scale.
#[must_use]
pub const fn is_decimal(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Numeric | SqlType::Decimal)
}

/// Integer types. `BIT` is classified as boolean, not integer.
#[must_use]
pub const fn is_integer(sql_type: SqlType) -> bool {
    matches!(
        sql_type,
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt
    )
}

/// Approximate numerics.
#[must_use]
pub const fn is_float(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Float | SqlType::Real | SqlType::Double)
}

/// Any numeric type: integer, approximate or exact.
#[must_use]
pub const fn is_number(sql_type: SqlType) -> bool {
    is_integer(sql_type) || is_float(sql_type) || is_decimal(sql_type)
}

/// Large objects. Their values are always run through the reversible codec.
#[must_use]
pub const fn is_large_object(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Clob | SqlType::NClob | SqlType::Blob)
}

/// Character large objects.
#[must_use]
pub const fn is_text_large_object(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Clob | SqlType::NClob)
}

/// Binary types, including `BLOB`.
#[must_use]
pub const fn is_binary(sql_type: SqlType) -> bool {
    matches!(
        sql_type,
        SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob
    )
}

/// Temporal types: `DATE`, `TIME` and `TIMESTAMP`.
#[must_use]
pub const fn is_date(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Date | SqlType::Time | SqlType::Timestamp)
}

/// `DATE` only.
#[must_use]
pub const fn is_date_only(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Date)
}

/// `TIME` only.
#[must_use]
pub const fn is_time(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Time)
}

/// `TIMESTAMP` only.
#[must_use]
pub const fn is_timestamp(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Timestamp)
}

/// `BOOLEAN` and `BIT`.
#[must_use]
pub const fn is_boolean(sql_type: SqlType) -> bool {
    matches!(sql_type, SqlType::Boolean | SqlType::Bit)
}
