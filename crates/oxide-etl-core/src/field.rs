//! Field (column) definitions.

use serde::{Deserialize, Serialize};

use crate::types::SqlType;

/// Describes one DataSet column.
///
/// `native_type` is the dialect spelling, possibly with a size suffix such as
/// `VARCHAR2(100)` or `NUMBER(10,2)`. `has_params` says whether a size suffix
/// belongs to this type and should be regenerated when the field is
/// translated to another dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Semantic SQL type.
    pub sql_type: SqlType,
    /// Dialect-specific type spelling.
    pub native_type: String,
    /// Display size or character length.
    pub size: Option<u32>,
    /// Numeric precision (or character length for character types).
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the field is shown/exported.
    pub visible: bool,
    /// Marked for removal at the next denormalization.
    pub to_delete: bool,
    /// Values are written through the reversible codec.
    pub encode: bool,
    /// Database generates the value.
    pub auto_increment: bool,
    /// Whether `native_type` carries a size suffix.
    pub has_params: bool,
    /// Number of value versions this field has been merged from (at least 1).
    pub version: u32,
}

impl FieldDef {
    /// Creates a nullable, visible field whose native type is the canonical
    /// name of `sql_type`.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            native_type: sql_type.as_str().to_string(),
            size: None,
            precision: None,
            scale: None,
            nullable: true,
            visible: true,
            to_delete: false,
            encode: false,
            auto_increment: false,
            has_params: false,
            version: 1,
        }
    }

    /// Sets the native type. A `(...)` suffix turns on `has_params` and
    /// fills precision and scale when they are not set yet.
    #[must_use]
    pub fn native_type(mut self, native: impl Into<String>) -> Self {
        self.native_type = native.into();
        if let Some((precision, scale)) = crate::sql_utils::scale_and_precision(&self.native_type)
        {
            self.has_params = true;
            self.precision = self.precision.or(Some(precision));
            self.scale = self.scale.or(scale);
        }
        self
    }

    /// Sets precision and optional scale, and marks the type as
    /// parameterized.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self.has_params = true;
        self
    }

    /// Sets the display size.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the field as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Hides the field.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Marks the field as auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the field for the reversible codec.
    #[must_use]
    pub fn encoded(mut self) -> Self {
        self.encode = true;
        self
    }

    /// Returns the native type without any `(...)` suffix.
    #[must_use]
    pub fn native_base_type(&self) -> &str {
        self.native_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim_end()
    }

    /// Structural equality used by DataSet equality: name, SQL type, native
    /// type and size.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.name == other.name
            && self.sql_type == other.sql_type
            && self.native_type == other.native_type
            && self.size == other.size
    }

    /// Clones the definition under a new name, resetting the version count.
    #[must_use]
    pub fn clone_as(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            to_delete: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("amount", SqlType::Numeric)
            .native_type("NUMBER(10,2)")
            .not_null();

        assert_eq!(field.name, "amount");
        assert!(field.has_params);
        assert_eq!(field.precision, Some(10));
        assert_eq!(field.scale, Some(2));
        assert!(!field.nullable);
        assert!(field.visible);
        assert_eq!(field.version, 1);
        assert_eq!(field.native_base_type(), "NUMBER");
    }

    #[test]
    fn test_native_type_without_params() {
        let field = FieldDef::new("notes", SqlType::Clob).native_type("CLOB");
        assert!(!field.has_params);
        assert_eq!(field.precision, None);
        assert_eq!(field.native_base_type(), "CLOB");
    }

    #[test]
    fn test_same_definition_ignores_flags() {
        let a = FieldDef::new("id", SqlType::Integer);
        let b = FieldDef::new("id", SqlType::Integer).hidden().not_null();
        assert!(a.same_definition(&b));
        assert!(!a.same_definition(&FieldDef::new("id", SqlType::BigInt)));
    }

    #[test]
    fn test_clone_as() {
        let mut field = FieldDef::new("name", SqlType::Varchar).precision(40, None);
        field.version = 3;
        let copy = field.clone_as("name_2");
        assert_eq!(copy.name, "name_2");
        assert_eq!(copy.version, 1);
        assert_eq!(copy.precision, Some(40));
    }
}
