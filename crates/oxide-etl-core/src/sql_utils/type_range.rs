//! Parsing and rendering of `(precision[,scale])` type suffixes.

use crate::field::FieldDef;

/// Returns the trimmed text between the first `(` and the matching `)`.
fn params_of(native: &str) -> Option<&str> {
    let open = native.find('(')?;
    let close = native[open..].find(')')? + open;
    Some(native[open + 1..close].trim())
}

fn parse_params(inner: &str) -> Option<(u32, Option<u32>)> {
    let mut parts = inner.split(',').map(str::trim);
    let precision = parts.next()?.parse().ok()?;
    let scale = match parts.next() {
        Some(s) => Some(s.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((precision, scale))
}

/// Parses `"TYPE(p)"` or `"TYPE(p,s)"` into `(p, Some(s))`.
///
/// Returns `None` when there are no parentheses, the parentheses are
/// empty, or the contents are not numeric (`VARCHAR(max)`).
///
/// ```rust
/// use oxide_etl_core::sql_utils::scale_and_precision;
///
/// assert_eq!(scale_and_precision("NUMBER(10, 2)"), Some((10, Some(2))));
/// assert_eq!(scale_and_precision("VARCHAR2(100)"), Some((100, None)));
/// assert_eq!(scale_and_precision("DATE"), None);
/// assert_eq!(scale_and_precision("CHAR()"), None);
/// ```
#[must_use]
pub fn scale_and_precision(native: &str) -> Option<(u32, Option<u32>)> {
    params_of(native)
        .filter(|inner| !inner.is_empty())
        .and_then(parse_params)
}

/// Renders `(p)` or `(p,s)`.
#[must_use]
pub fn format_range(precision: u32, scale: Option<u32>) -> String {
    match scale {
        Some(scale) => format!("({precision},{scale})"),
        None => format!("({precision})"),
    }
}

/// Re-renders the size suffix of `native` against default limits.
///
/// Without `force`, each component is clamped to its default when one is
/// given. With `force`, the default precision replaces the parsed one and
/// the scale becomes the lower of the default scale and the new precision.
/// A `(max)` suffix is passed through; a type with no usable suffix yields
/// an empty string.
///
/// ```rust
/// use oxide_etl_core::sql_utils::type_range;
///
/// assert_eq!(type_range("number(100, 200)", Some(10), Some(20), false), "(10,20)");
/// assert_eq!(type_range("number(100,200)", Some(10), Some(20), true), "(10,10)");
/// assert_eq!(type_range("varchar(max)", Some(10), None, false), "(max)");
/// assert_eq!(type_range("integer", Some(10), None, false), "");
/// ```
#[must_use]
pub fn type_range(
    native: &str,
    default_precision: Option<u32>,
    default_scale: Option<u32>,
    force: bool,
) -> String {
    let Some(inner) = params_of(native) else {
        return String::new();
    };
    if inner.eq_ignore_ascii_case("max") {
        return "(max)".to_string();
    }
    let Some((precision, scale)) = parse_params(inner) else {
        return String::new();
    };

    let precision = match default_precision {
        Some(default) if force => default,
        Some(default) => precision.min(default),
        None => precision,
    };
    let scale = scale.map(|scale| match default_scale {
        Some(default) if force => default.min(precision),
        Some(default) => scale.min(default),
        None => scale,
    });
    format_range(precision, scale)
}

/// Translates a field's native type into the spelling of a destination
/// template.
///
/// - No template: the source native type, unchanged.
/// - Template with parameters and a precision: the template's base type
///   with the template's own precision and scale.
/// - Template with parameters but no precision: the template's base type
///   with the source's size suffix.
/// - Template without parameters: the template's bare base type.
#[must_use]
pub fn convert_data_type(source: &FieldDef, dest: Option<&FieldDef>) -> String {
    let Some(dest) = dest else {
        return source.native_type.clone();
    };
    let base = dest.native_base_type();
    if !dest.has_params {
        return base.to_string();
    }
    match dest.precision {
        Some(precision) => format!("{base}{}", format_range(precision, dest.scale)),
        None => format!("{base}{}", type_range(&source.native_type, None, None, false)),
    }
}
