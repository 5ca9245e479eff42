//! DataSet behavior: versions, equality, sorting, filtering, encoding.

mod common;
use common::*;

use std::sync::Arc;

use oxide_etl_core::driver::{self, OracleDriver};
use oxide_etl_core::sql_utils::type_range;
use oxide_etl_core::{ConversionParams, DataSet, Driver, FieldDef, Record, SqlType, Value};

#[test]
fn version_removal_keeps_order() {
    let mut r = Record::new(vec![text("first")]);
    assert_eq!(r.number_of_versions(0), 1);
    r.add_version(0, text("abc"));
    r.add_version(0, text("xyz"));
    assert_eq!(r.number_of_versions(0), 3);
    assert_eq!(r.version(0, 1), Some(&text("abc")));

    r.remove_version(0, 1);
    assert_eq!(r.number_of_versions(0), 2);
    assert_eq!(r.version(0, 1), Some(&text("xyz")));

    // The primary value survives.
    assert_eq!(r.remove_version(0, 0), None);
    assert_eq!(r.value(0), Some(&text("first")));
}

#[test]
fn type_range_examples() {
    assert_eq!(type_range("number(100, 200)", Some(10), Some(20), false), "(10,20)");
    assert_eq!(type_range("number(100,200)", Some(10), Some(20), true), "(10,10)");
}

#[test]
fn equality_ignores_names() {
    let a = customers();
    let mut b = customers();
    b.set_name("renamed");
    b.set_table_name(Some("elsewhere".into()));
    assert_eq!(a, b);

    b.set_field_value(0, 1, text("Ava")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn filter_applies_when_records_are_added() {
    let mut ds = DataSet::new("nums").with_fields([FieldDef::new("field1", SqlType::Integer)]);
    ds.set_filter(Some("field1 >= 2 and field1 <= 5 and field1 <> 3")).unwrap();
    let added: Vec<bool> = (1..=6).map(|n| ds.add_record(Record::new(vec![int(n)]))).collect();
    assert_eq!(added, [false, true, false, true, true, false]);
    assert_eq!(column(&ds, "field1"), [int(2), int(4), int(5)]);
    assert!(ds.set_filter(Some("field1 >=")).is_err());
}

#[test]
fn record_predicate_suppresses_duplicates() {
    let mut ds = DataSet::new("uniq")
        .with_fields([FieldDef::new("id", SqlType::Integer)])
        .with_key_fields("id");
    ds.set_record_predicate(Some(Arc::new(|ds: &DataSet, r: &Record| {
        ds.key_of(r).map_or(true, |k| ds.find_by_key(&k).is_none())
    })));
    assert!(ds.add_record(Record::new(vec![int(1)])));
    assert!(!ds.add_record(Record::new(vec![int(1)])));
    assert!(ds.add_record(Record::new(vec![int(2)])));
    assert_eq!(ds.record_count(), 2);
}

#[test]
fn sort_by_string_is_stable() {
    let mut c = customers();
    c.sort_by_string("region desc").unwrap();
    assert_eq!(
        column(&c, "name"),
        [text("Brian"), text("Ada"), text("Dmitri"), text("Chloe")]
    );
    c.sort_by_string("id").unwrap();
    assert_eq!(column(&c, "id"), [int(1), int(2), int(3), int(4)]);
}

#[test]
fn encode_decode_round_trip() {
    let ds = DataSet::new("docs");
    let params = ConversionParams::default();
    let fields = [
        FieldDef::new("title", SqlType::Varchar),
        FieldDef::new("body", SqlType::Clob),
        FieldDef::new("raw", SqlType::Blob),
    ];
    let drivers: Vec<Option<Arc<dyn Driver>>> = vec![
        None,
        Some(Arc::new(OracleDriver) as Arc<dyn Driver>),
        Some(driver::by_name("sqlserver").unwrap()),
    ];
    let values = [
        Value::Null,
        text("plain"),
        text("a,b;\"c\"\n\td"),
        text(&"clob ".repeat(20_000)),
    ];
    for field in &fields {
        for d in &drivers {
            let d = d.as_deref();
            for v in &values {
                let v = if field.sql_type == SqlType::Blob {
                    match v {
                        Value::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
                        other => other.clone(),
                    }
                } else {
                    v.clone()
                };
                let encoded = ds.encode(field, &v, d, &params, false);
                let decoded = ds.decode(field, encoded.as_deref(), d, &params, false).unwrap();
                assert_eq!(decoded, v, "{} with {:?}", field.name, d.map(Driver::name));
            }
        }
    }
}

#[test]
fn populate_then_emit_inserts() {
    use oxide_etl_core::sql_utils::{populate_data_set, ColumnMeta, PopulateOptions, VecResultSet};

    let mut rs = VecResultSet::new(
        vec![
            ColumnMeta::new("id", SqlType::Integer),
            ColumnMeta::new("name", SqlType::Varchar),
        ],
        vec![vec![int(1), text("it's")], vec![int(2), Value::Null]],
    );
    let oracle = OracleDriver;
    let mut ds = DataSet::new("people");
    let n = populate_data_set(&mut ds, &oracle, &mut rs, &PopulateOptions::default()).unwrap();
    assert_eq!(n, 2);

    let mut out = String::new();
    for record in ds.records() {
        let mut fields = indexmap::IndexMap::new();
        for (col, field) in ds.fields().iter().enumerate() {
            let v = record.value(col).unwrap();
            fields.insert(
                field.name.clone(),
                oracle.convert_value_for_storage(v, field.sql_type, false).unwrap(),
            );
        }
        out.push_str(&oracle.insert_statement(&fields, ds.table_name()));
    }
    assert_eq!(
        out,
        "insert into people(\nid,\nname\n) values (\n1,\n'it''s'\n);\n\
         insert into people(\nid,\nname\n) values (\n2,\nNULL\n);\n"
    );
}
