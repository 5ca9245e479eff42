//! Cell values.
//!
//! A [`Value`] is what a DataSet cell holds. Values are never converted
//! implicitly: reading a cell returns exactly what was stored, and type
//! coercion happens only in the codec, the drivers and `sql_utils`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Default `strftime` pattern for dates.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default `strftime` pattern for times.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.f";
/// Default `strftime` pattern for timestamps. Fractional seconds are optional.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Character data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as text, or `None` for NULL.
    ///
    /// Dates use the default formats, binary data is rendered as upper-case
    /// hex. This is the string form used for key matching, grouping and
    /// duplicate detection.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// Returns the value as `f64` when it is numeric or numeric text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Natural ordering used by sorting and filter comparisons.
    ///
    /// NULL sorts first. Numbers compare numerically across `Int`/`Float`,
    /// temporal values chronologically, everything else by text.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                let a = self.as_f64().unwrap_or_default();
                let b = other.as_f64().unwrap_or_default();
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Date(a), Self::Timestamp(b)) => a.and_time(NaiveTime::MIN).cmp(b),
            (Self::Timestamp(a), Self::Date(b)) => a.cmp(&b.and_time(NaiveTime::MIN)),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) if !self.is_textual() || !other.is_textual() => {
                    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
                }
                _ => self.to_string().cmp(&other.to_string()),
            },
        }
    }

    const fn is_textual(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&hex::encode_upper(b)),
            Self::Date(d) => write!(f, "{}", d.format(DEFAULT_DATE_FORMAT)),
            Self::Time(t) => write!(f, "{}", t.format(DEFAULT_TIME_FORMAT)),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(DEFAULT_TIMESTAMP_FORMAT)),
        }
    }
}

/// Trait for types that can be stored in a cell.
pub trait IntoValue {
    /// Converts into a [`Value`].
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for i16 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(String::from(self))
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl IntoValue for NaiveDate {
    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl IntoValue for NaiveTime {
    fn into_value(self) -> Value {
        Value::Time(self)
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_text() {
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::Int(42).as_text().as_deref(), Some("42"));
        assert_eq!(Value::Text("abc".into()).as_text().as_deref(), Some("abc"));
        assert_eq!(
            Value::Bytes(vec![0xCA, 0xFE]).as_text().as_deref(),
            Some("CAFE")
        );
    }

    #[test]
    fn test_timestamp_display_omits_zero_fraction() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-03-01 08:30:00");
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.0).compare(&Value::Int(3)), Ordering::Equal);
    }

    #[test]
    fn test_compare_null_first() {
        assert_eq!(Value::Null.compare(&Value::Int(0)), Ordering::Less);
        assert_eq!(Value::Text("a".into()).compare(&Value::Null), Ordering::Greater);
    }

    #[test]
    fn test_compare_number_with_numeric_text() {
        assert_eq!(
            Value::Int(10).compare(&Value::Text("9".into())),
            Ordering::Greater
        );
        // Two text values compare lexically even when they look numeric.
        assert_eq!(
            Value::Text("10".into()).compare(&Value::Text("9".into())),
            Ordering::Less
        );
    }

    #[test]
    fn test_into_value() {
        assert_eq!(42_i32.into_value(), Value::Int(42));
        assert_eq!("x".into_value(), Value::Text("x".into()));
        assert_eq!(None::<i64>.into_value(), Value::Null);
        assert_eq!(Some(1.5_f64).into_value(), Value::Float(1.5));
    }
}
