#![allow(dead_code)]

use indexmap::IndexMap;
use oxide_etl_core::{DataSet, FieldDef, Record, SqlType, Value};

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn int(n: i64) -> Value {
    Value::Int(n)
}

/// Builds a DataSet from `(name, type)` pairs and rows of values.
pub fn dataset(name: &str, fields: &[(&str, SqlType)], rows: Vec<Vec<Value>>) -> DataSet {
    let mut ds = DataSet::new(name)
        .with_fields(fields.iter().map(|(n, t)| FieldDef::new(*n, *t)));
    for row in rows {
        assert!(ds.add_record(Record::new(row)), "record rejected");
    }
    ds
}

pub fn field_names(ds: &DataSet) -> Vec<String> {
    ds.fields().iter().map(|f| f.name.clone()).collect()
}

pub fn column(ds: &DataSet, name: &str) -> Vec<Value> {
    (0..ds.record_count())
        .map(|row| {
            ds.field_value_by_name(row, name)
                .unwrap_or_else(|| panic!("no field {name} in row {row}"))
                .clone()
        })
        .collect()
}

/// Ordered field-name to literal map, as the statement builders take it.
pub fn literals(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Customers keyed by `id`, one with a NULL region.
pub fn customers() -> DataSet {
    dataset(
        "customers",
        &[
            ("id", SqlType::Integer),
            ("name", SqlType::Varchar),
            ("region", SqlType::Varchar),
        ],
        vec![
            vec![int(1), text("Ada"), text("north")],
            vec![int(2), text("Brian"), text("south")],
            vec![int(3), text("Chloe"), Value::Null],
            vec![int(4), text("Dmitri"), text("north")],
        ],
    )
}

/// Orders referencing customers by `id`; customer 9 does not exist.
pub fn orders() -> DataSet {
    dataset(
        "orders",
        &[
            ("order_no", SqlType::Integer),
            ("id", SqlType::Integer),
            ("amount", SqlType::Double),
        ],
        vec![
            vec![int(100), int(1), Value::Float(12.5)],
            vec![int(101), int(2), Value::Float(3.0)],
            vec![int(102), int(1), Value::Float(7.25)],
            vec![int(103), int(9), Value::Float(1.0)],
        ],
    )
}
