//! Per-table type overrides consulted by [`Driver::get_type`].
//!
//! [`Driver::get_type`]: crate::driver::Driver::get_type

use std::collections::HashMap;

use crate::field::FieldDef;
use crate::types::SqlType;

/// Source of native type templates keyed by a repository key (usually a
/// table name) and a SQL type.
pub trait FieldsRepository {
    /// Templates registered for `key` and `sql_type`, in registration order.
    fn field_defs(&self, key: &str, sql_type: SqlType) -> Vec<FieldDef>;
}

/// In-memory [`FieldsRepository`].
#[derive(Debug, Default, Clone)]
pub struct MapFieldsRepository {
    entries: HashMap<(String, SqlType), Vec<FieldDef>>,
}

impl MapFieldsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under `key`, for the template's SQL type.
    pub fn add(&mut self, key: impl Into<String>, field: FieldDef) {
        self.entries
            .entry((key.into(), field.sql_type))
            .or_default()
            .push(field);
    }

    /// Builder form of [`MapFieldsRepository::add`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, field: FieldDef) -> Self {
        self.add(key, field);
        self
    }
}

impl FieldsRepository for MapFieldsRepository {
    fn field_defs(&self, key: &str, sql_type: SqlType) -> Vec<FieldDef> {
        self.entries
            .get(&(key.to_string(), sql_type))
            .cloned()
            .unwrap_or_default()
    }
}
