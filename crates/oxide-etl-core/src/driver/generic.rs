//! ANSI SQL driver.
//!
//! Declares no limits of its own. Limits come from the constructor or from
//! a parent driver, which makes it the usual base for ad-hoc dialects.

use std::sync::Arc;

use crate::error::Result;
use crate::types::SqlType;

use super::{by_name, Driver, DriverLimits};

/// ANSI SQL driver with configurable limits and an optional parent.
#[derive(Debug, Clone, Default)]
pub struct GenericDriver {
    limits: DriverLimits,
    parent: Option<Arc<dyn Driver>>,
}

impl GenericDriver {
    /// Creates a driver with no limits and no parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver declaring `limits`.
    #[must_use]
    pub fn with_limits(limits: DriverLimits) -> Self {
        Self {
            limits,
            parent: None,
        }
    }

    /// Sets the parent consulted for undeclared limits.
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<dyn Driver>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets or clears the parent driver.
    pub fn set_parent(&mut self, parent: Option<Arc<dyn Driver>>) {
        self.parent = parent;
    }

    /// Sets the parent driver by dialect name.
    pub fn set_parent_driver_name(&mut self, name: &str) -> Result<()> {
        self.parent = Some(by_name(name)?);
        Ok(())
    }
}

impl Driver for GenericDriver {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn limits(&self) -> &DriverLimits {
        &self.limits
    }

    fn parent(&self) -> Option<&dyn Driver> {
        self.parent.as_deref()
    }

    fn type_mapping(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Bit | SqlType::Boolean => "BOOLEAN",
            SqlType::TinyInt | SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Float => "FLOAT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Numeric => "NUMERIC",
            SqlType::Decimal => "DECIMAL",
            SqlType::Char => "CHAR",
            SqlType::NChar => "NCHAR",
            SqlType::Varchar => "VARCHAR",
            SqlType::NVarchar => "NVARCHAR",
            SqlType::LongVarchar | SqlType::Clob | SqlType::Other | SqlType::Null => "CLOB",
            SqlType::LongNVarchar | SqlType::NClob => "NCLOB",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::LongVarBinary | SqlType::Blob => "BLOB",
        }
    }
}
