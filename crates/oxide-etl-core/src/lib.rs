//! # oxide-etl-core
//!
//! An in-memory table, relational operators over it, and SQL generation
//! for several database dialects.
//!
//! This crate provides:
//! - [`DataSet`]: ordered fields and records, with versioned cells, key
//!   lookup, sorting and filter expressions
//! - [`relational`]: join, union, minus, split and denormalize
//! - [`Driver`]: per-dialect type mapping, literals, DML/DDL and procedural
//!   SQL fragments
//! - [`sql_utils`]: type classification, type inference, type ranges,
//!   identifier parsing and result-set population
//!
//! The core performs no I/O. Connectors hand it already-fetched rows and
//! take back SQL text.
//!
//! ## Building a DataSet and emitting SQL
//!
//! ```rust
//! use indexmap::IndexMap;
//! use oxide_etl_core::driver::SqliteDriver;
//! use oxide_etl_core::{DataSet, Driver, FieldDef, Record, SqlType, Value};
//!
//! let mut ds = DataSet::new("users")
//!     .with_fields([
//!         FieldDef::new("id", SqlType::Integer),
//!         FieldDef::new("name", SqlType::Varchar),
//!     ])
//!     .with_key_fields("id");
//! ds.add_record(Record::new(vec![Value::Int(1), Value::Text("O'Hara".into())]));
//!
//! let driver = SqliteDriver;
//! let mut fields = IndexMap::new();
//! for (col, field) in ds.fields().iter().enumerate() {
//!     let value = ds.field_value(0, col).unwrap();
//!     let literal = driver.convert_value_for_storage(value, field.sql_type, false).unwrap();
//!     fields.insert(field.name.clone(), literal);
//! }
//! assert_eq!(
//!     driver.update_statement(&fields, ds.table_name(), "id"),
//!     "update users\nset name='O''Hara'\nwhere id=1;\n"
//! );
//! ```

pub mod codec;
pub mod data;
pub mod dataset;
pub mod driver;
pub mod error;
pub mod field;
pub mod filter;
pub mod record;
pub mod relational;
pub mod repository;
pub mod sql_utils;
pub mod types;
pub mod value;

pub use codec::ConversionParams;
pub use data::DataSetData;
pub use dataset::{DataSet, RecordPredicate};
pub use driver::Driver;
pub use error::{EtlError, Result};
pub use field::FieldDef;
pub use filter::Filter;
pub use record::{Cell, Record};
pub use repository::{FieldsRepository, MapFieldsRepository};
pub use types::SqlType;
pub use value::{IntoValue, Value};
