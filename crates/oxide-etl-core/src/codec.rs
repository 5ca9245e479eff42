//! Text encoding of cell values for non-SQL sinks.
//!
//! [`DataSet::encode`] renders a value as text for delimited files or XML,
//! and [`DataSet::decode`] turns that text back into a value. Encoded fields
//! and large objects go through base64 so their content never clashes with
//! delimiters, quotes or newlines of the sink. Other binary values are
//! written as hex.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::dataset::DataSet;
use crate::driver::Driver;
use crate::error::{EtlError, Result};
use crate::field::FieldDef;
use crate::sql_utils::{is_binary, is_boolean, is_char, is_decimal, is_float, is_integer};
use crate::types::SqlType;
use crate::value::{Value, DEFAULT_DATE_FORMAT, DEFAULT_TIMESTAMP_FORMAT, DEFAULT_TIME_FORMAT};

/// Conversion settings shared by the codec and type inference.
///
/// Formats are chrono `strftime` patterns. Unset formats fall back to the
/// driver's formats, then to the crate defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionParams {
    /// Date pattern, e.g. `%d/%m/%Y`.
    pub date_format: Option<String>,
    /// Time pattern.
    pub time_format: Option<String>,
    /// Timestamp pattern.
    pub timestamp_format: Option<String>,
    /// Quote character marking a token as text during inference.
    pub quote: Option<char>,
    /// Trim tokens before inference.
    pub trim: bool,
}

impl ConversionParams {
    /// Date pattern, or the default.
    #[must_use]
    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    /// Time pattern, or the default.
    #[must_use]
    pub fn time_format(&self) -> &str {
        self.time_format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
    }

    /// Timestamp pattern, or the default.
    #[must_use]
    pub fn timestamp_format(&self) -> &str {
        self.timestamp_format
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FORMAT)
    }
}

struct Formats<'a> {
    date: &'a str,
    time: &'a str,
    timestamp: &'a str,
}

impl<'a> Formats<'a> {
    fn resolve(params: &'a ConversionParams, driver: Option<&'a dyn Driver>) -> Self {
        Self {
            date: params
                .date_format
                .as_deref()
                .or_else(|| driver.and_then(Driver::date_format))
                .unwrap_or(DEFAULT_DATE_FORMAT),
            time: params
                .time_format
                .as_deref()
                .or_else(|| driver.and_then(Driver::time_format))
                .unwrap_or(DEFAULT_TIME_FORMAT),
            timestamp: params
                .timestamp_format
                .as_deref()
                .or_else(|| driver.and_then(Driver::timestamp_format))
                .unwrap_or(DEFAULT_TIMESTAMP_FORMAT),
        }
    }
}

fn plain_text(value: &Value, formats: &Formats<'_>) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => {
            let text = x.to_string();
            if text.contains(['.', 'e', 'E', 'i', 'N']) {
                text
            } else {
                format!("{text}.0")
            }
        }
        Value::Text(s) => s.clone(),
        Value::Bytes(b) => hex::encode_upper(b),
        Value::Date(d) => d.format(formats.date).to_string(),
        Value::Time(t) => t.format(formats.time).to_string(),
        Value::Timestamp(ts) => ts.format(formats.timestamp).to_string(),
    }
}

fn decode_error(field: &FieldDef, message: impl ToString) -> EtlError {
    EtlError::Decode {
        field: field.name.clone(),
        message: message.to_string(),
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "y" | "yes" => Some(true),
        "false" | "f" | "0" | "n" | "no" => Some(false),
        _ => None,
    }
}

fn parse_typed(field: &FieldDef, text: &str, formats: &Formats<'_>) -> Result<Value> {
    let t = field.sql_type;
    if is_char(t) || matches!(t, SqlType::Clob | SqlType::NClob | SqlType::Other | SqlType::Null) {
        return Ok(Value::Text(text.to_string()));
    }
    if text.is_empty() {
        return Ok(Value::Null);
    }
    let value = if is_integer(t) {
        Value::Int(text.trim().parse().map_err(|e| decode_error(field, e))?)
    } else if is_float(t) {
        Value::Float(text.trim().parse().map_err(|e| decode_error(field, e))?)
    } else if is_decimal(t) {
        let text = text.trim();
        match text.parse::<i64>() {
            Ok(n) if !text.contains(['.', 'e', 'E']) => Value::Int(n),
            _ => Value::Float(text.parse().map_err(|e| decode_error(field, e))?),
        }
    } else if is_boolean(t) {
        Value::Bool(parse_bool(text).ok_or_else(|| decode_error(field, "not a boolean"))?)
    } else {
        match t {
            SqlType::Date => Value::Date(
                NaiveDate::parse_from_str(text, formats.date).map_err(|e| decode_error(field, e))?,
            ),
            SqlType::Time => Value::Time(
                NaiveTime::parse_from_str(text, formats.time).map_err(|e| decode_error(field, e))?,
            ),
            SqlType::Timestamp => Value::Timestamp(
                NaiveDateTime::parse_from_str(text, formats.timestamp)
                    .map_err(|e| decode_error(field, e))?,
            ),
            _ => Value::Text(text.to_string()),
        }
    };
    Ok(value)
}

impl DataSet {
    fn codec_driver<'a>(&'a self, driver: Option<&'a dyn Driver>) -> Option<&'a dyn Driver> {
        driver.or_else(|| self.driver().map(|d| &**d))
    }

    /// Renders `value` as text for a non-SQL sink. Returns `None` for NULL.
    ///
    /// Values of encoded fields (see [`DataSet::is_field_encoded`]), or any
    /// field when `force` is set, are base64 encoded. Dates use the formats
    /// in `params`, then those of `driver` (or the DataSet's own driver),
    /// then the defaults.
    #[must_use]
    pub fn encode(
        &self,
        field: &FieldDef,
        value: &Value,
        driver: Option<&dyn Driver>,
        params: &ConversionParams,
        force: bool,
    ) -> Option<String> {
        if value.is_null() {
            return None;
        }
        let formats = Formats::resolve(params, self.codec_driver(driver));
        if force || self.is_field_encoded(field) {
            let text = match value {
                Value::Bytes(bytes) => STANDARD.encode(bytes),
                other => STANDARD.encode(plain_text(other, &formats)),
            };
            Some(text)
        } else {
            Some(plain_text(value, &formats))
        }
    }

    /// Inverse of [`DataSet::encode`] for the same field, driver, params and
    /// `force` flag. `None` decodes to NULL.
    pub fn decode(
        &self,
        field: &FieldDef,
        text: Option<&str>,
        driver: Option<&dyn Driver>,
        params: &ConversionParams,
        force: bool,
    ) -> Result<Value> {
        let Some(text) = text else {
            return Ok(Value::Null);
        };
        let formats = Formats::resolve(params, self.codec_driver(driver));

        if force || self.is_field_encoded(field) {
            let bytes = STANDARD
                .decode(text)
                .map_err(|e| decode_error(field, e))?;
            if is_binary(field.sql_type) {
                return Ok(Value::Bytes(bytes));
            }
            let text = String::from_utf8(bytes).map_err(|e| decode_error(field, e))?;
            return parse_typed(field, &text, &formats);
        }

        if is_binary(field.sql_type) {
            return hex::decode(text.trim())
                .map(Value::Bytes)
                .map_err(|e| decode_error(field, e));
        }
        parse_typed(field, text, &formats)
    }
}
