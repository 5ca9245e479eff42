//! Type inference for untyped text, as found in delimited files.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::{is_binary, is_decimal, is_fixed_char, is_float, is_integer, is_number};
use crate::codec::ConversionParams;
use crate::types::SqlType;
use crate::value::Value;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"));

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
});

/// Infers the most specific SQL type of a raw text token and returns it
/// with the typed value.
///
/// In order: a token wrapped in the configured quote character is
/// `VARCHAR` with the quotes stripped; an integer that fits in `i64` is
/// `INTEGER`; a decimal or exponent literal is `FLOAT`; then the timestamp,
/// date and time formats from `params` (or the defaults) are tried.
/// Anything else is `VARCHAR`. An empty token is an untyped NULL.
///
/// ```rust
/// use oxide_etl_core::codec::ConversionParams;
/// use oxide_etl_core::sql_utils::type_and_value;
/// use oxide_etl_core::{SqlType, Value};
///
/// let params = ConversionParams::default();
/// assert_eq!(type_and_value("42", &params), (SqlType::Integer, Value::Int(42)));
/// assert_eq!(type_and_value("4.5", &params), (SqlType::Float, Value::Float(4.5)));
/// ```
#[must_use]
pub fn type_and_value(text: &str, params: &ConversionParams) -> (SqlType, Value) {
    let token = if params.trim { text.trim() } else { text };
    if token.is_empty() {
        return (SqlType::Null, Value::Null);
    }

    if let Some(quote) = params.quote {
        let q = quote.len_utf8();
        if token.len() >= 2 * q && token.starts_with(quote) && token.ends_with(quote) {
            return (
                SqlType::Varchar,
                Value::Text(token[q..token.len() - q].to_string()),
            );
        }
    }

    if INTEGER.is_match(token) {
        if let Ok(n) = token.parse::<i64>() {
            return (SqlType::Integer, Value::Int(n));
        }
    }
    if DECIMAL.is_match(token) {
        if let Ok(f) = token.parse::<f64>() {
            return (SqlType::Float, Value::Float(f));
        }
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(token, params.timestamp_format()) {
        return (SqlType::Timestamp, Value::Timestamp(ts));
    }
    if let Ok(date) = NaiveDate::parse_from_str(token, params.date_format()) {
        return (SqlType::Date, Value::Date(date));
    }
    if let Ok(time) = NaiveTime::parse_from_str(token, params.time_format()) {
        return (SqlType::Time, Value::Time(time));
    }

    (SqlType::Varchar, Value::Text(token.to_string()))
}

const fn integer_rank(sql_type: SqlType) -> u8 {
    match sql_type {
        SqlType::TinyInt => 1,
        SqlType::SmallInt => 2,
        SqlType::Integer => 3,
        SqlType::BigInt => 4,
        _ => 0,
    }
}

const fn float_rank(sql_type: SqlType) -> u8 {
    match sql_type {
        SqlType::Real => 1,
        SqlType::Float | SqlType::Double => 2,
        _ => 0,
    }
}

/// Whether a column of type `target` can hold values of type `source`
/// without widening.
///
/// The relation is directional: `FLOAT` accepts `INTEGER` but `INTEGER`
/// does not accept `FLOAT`.
#[must_use]
pub fn is_compatible(target: SqlType, source: SqlType) -> bool {
    if target == source || source == SqlType::Null {
        return true;
    }
    match target {
        SqlType::Varchar
        | SqlType::LongVarchar
        | SqlType::NVarchar
        | SqlType::LongNVarchar
        | SqlType::Clob
        | SqlType::NClob => !is_binary(source),
        SqlType::Char | SqlType::NChar => is_fixed_char(source),
        SqlType::Float | SqlType::Real | SqlType::Double => {
            is_integer(source) || (is_float(source) && float_rank(source) <= float_rank(target))
        }
        SqlType::Numeric | SqlType::Decimal => is_integer(source) || is_decimal(source),
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            is_integer(source) && integer_rank(source) <= integer_rank(target)
        }
        SqlType::Timestamp => source == SqlType::Date,
        SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob => is_binary(source),
        _ => false,
    }
}

/// Resolves a column type while scanning rows of untyped data.
///
/// The first observation types the column. After that the existing type is
/// kept when it accepts the new one, replaced when the new one accepts it,
/// widened to `FLOAT` when both are numeric, and widened to `VARCHAR`
/// otherwise.
#[must_use]
pub fn field_type(new_type: SqlType, existing: SqlType, already_typed: bool) -> SqlType {
    if !already_typed || existing == SqlType::Null {
        return new_type;
    }
    if new_type == SqlType::Null || is_compatible(existing, new_type) {
        return existing;
    }
    if is_compatible(new_type, existing) {
        return new_type;
    }
    if is_number(existing) && is_number(new_type) {
        return SqlType::Float;
    }
    SqlType::Varchar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_value_numbers() {
        let params = ConversionParams::default();
        assert_eq!(type_and_value("-17", &params), (SqlType::Integer, Value::Int(-17)));
        assert_eq!(type_and_value("+3", &params), (SqlType::Integer, Value::Int(3)));
        assert_eq!(type_and_value(".5", &params), (SqlType::Float, Value::Float(0.5)));
        assert_eq!(type_and_value("1e3", &params), (SqlType::Float, Value::Float(1000.0)));
        // Overflows i64, still a number.
        assert_eq!(
            type_and_value("99999999999999999999", &params).0,
            SqlType::Float
        );
    }

    #[test]
    fn test_type_and_value_dates() {
        let params = ConversionParams::default();
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            type_and_value("2024-02-29", &params),
            (SqlType::Date, Value::Date(day))
        );
        assert_eq!(
            type_and_value("2024-02-29 13:45:00.250", &params).0,
            SqlType::Timestamp
        );
        assert_eq!(type_and_value("13:45:00", &params).0, SqlType::Time);
        assert_eq!(type_and_value("2024-02-30", &params).0, SqlType::Varchar);
    }

    #[test]
    fn test_type_and_value_custom_formats() {
        let params = ConversionParams {
            date_format: Some("%d/%m/%Y".into()),
            ..ConversionParams::default()
        };
        assert_eq!(
            type_and_value("29/02/2024", &params),
            (SqlType::Date, Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(type_and_value("2024-02-29", &params).0, SqlType::Varchar);
    }

    #[test]
    fn test_type_and_value_quotes_and_trim() {
        let params = ConversionParams {
            quote: Some('"'),
            trim: true,
            ..ConversionParams::default()
        };
        assert_eq!(
            type_and_value("  \"123\" ", &params),
            (SqlType::Varchar, Value::Text("123".into()))
        );
        assert_eq!(
            type_and_value(" 12 ", &params),
            (SqlType::Integer, Value::Int(12))
        );
        assert_eq!(type_and_value("   ", &params), (SqlType::Null, Value::Null));
        assert_eq!(
            type_and_value("\"", &params),
            (SqlType::Varchar, Value::Text("\"".into()))
        );
    }

    #[test]
    fn test_is_compatible_is_directional() {
        assert!(is_compatible(SqlType::Float, SqlType::Integer));
        assert!(!is_compatible(SqlType::Integer, SqlType::Float));
        assert!(is_compatible(SqlType::Numeric, SqlType::Integer));
        assert!(!is_compatible(SqlType::Integer, SqlType::Numeric));
        assert!(is_compatible(SqlType::BigInt, SqlType::SmallInt));
        assert!(!is_compatible(SqlType::SmallInt, SqlType::BigInt));
        assert!(is_compatible(SqlType::Varchar, SqlType::Date));
        assert!(!is_compatible(SqlType::Char, SqlType::Integer));
        assert!(is_compatible(SqlType::Timestamp, SqlType::Date));
        assert!(!is_compatible(SqlType::Varchar, SqlType::Blob));
    }

    #[test]
    fn test_field_type_widening() {
        assert_eq!(
            field_type(SqlType::Float, SqlType::Integer, false),
            SqlType::Float
        );
        assert_eq!(
            field_type(SqlType::Integer, SqlType::Float, true),
            SqlType::Float
        );
        assert_eq!(
            field_type(SqlType::Float, SqlType::Integer, true),
            SqlType::Float
        );
        assert_eq!(
            field_type(SqlType::Integer, SqlType::Char, true),
            SqlType::Varchar
        );
        assert_eq!(
            field_type(SqlType::Float, SqlType::Decimal, true),
            SqlType::Float
        );
        assert_eq!(
            field_type(SqlType::Date, SqlType::Timestamp, true),
            SqlType::Timestamp
        );
        assert_eq!(
            field_type(SqlType::Null, SqlType::Date, true),
            SqlType::Date
        );
    }
}
