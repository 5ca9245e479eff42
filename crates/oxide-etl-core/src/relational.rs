//! Relational operators over DataSets.
//!
//! Join, union and minus take optional inputs so they can be called with
//! whatever an ETL step happens to have. Degenerate calls (a missing input,
//! a blank key, a key field absent from an input) are no-ops rather than
//! errors: they return `None` or the driving DataSet itself as
//! [`Cow::Borrowed`], so callers can detect the no-op by matching on the
//! variant. Every other call builds a new DataSet.
//!
//! Keys are comma-delimited field names. Key values are compared through
//! their text form, and a record whose key has a NULL part never matches
//! anything.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::dataset::{compose_key, DataSet, KEY_SEPARATOR};
use crate::driver::key_list;
use crate::record::{Cell, Record};

/// Resolves `key` against `ds`. `None` when the key is blank or a key field
/// does not exist.
fn key_indexes(ds: &DataSet, key: Option<&str>) -> Option<Vec<usize>> {
    let keys = key_list(key?);
    if keys.is_empty() {
        return None;
    }
    keys.iter().map(|k| ds.field_index(k)).collect()
}

fn is_blank(key: Option<&str>) -> bool {
    key.map_or(true, |k| key_list(k).is_empty())
}

/// Text of the whole row, used for full-row duplicate detection.
fn row_text(record: &Record) -> String {
    let mut text = String::new();
    for (n, value) in record.values().enumerate() {
        if n > 0 {
            text.push(KEY_SEPARATOR);
        }
        match value.as_text() {
            Some(v) => text.push_str(&v),
            None => text.push('\0'),
        }
    }
    text
}

/// `name` if unused, else `<prefix>_<name>`, else that with a numeric
/// suffix. The chosen name is recorded in `taken`.
fn unique_name(taken: &mut HashSet<String>, prefix: &str, name: &str) -> String {
    let mut candidate = name.to_string();
    if taken.contains(&candidate) {
        let base = format!("{prefix}_{name}");
        candidate.clone_from(&base);
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
    }
    taken.insert(candidate.clone());
    candidate
}

/// Restricts `ds` to the `include` fields, in that order, then drops the
/// `exclude` fields. Unknown names are ignored.
fn project(ds: DataSet, include: Option<&str>, exclude: Option<&str>) -> DataSet {
    let include = include.map(key_list).filter(|names| !names.is_empty());
    let exclude = exclude.map(key_list).filter(|names| !names.is_empty());
    if include.is_none() && exclude.is_none() {
        return ds;
    }

    let mut cols: Vec<usize> = match &include {
        Some(names) => names.iter().filter_map(|n| ds.field_index(n)).collect(),
        None => (0..ds.field_count()).collect(),
    };
    if let Some(names) = &exclude {
        cols.retain(|&col| {
            ds.field(col)
                .is_some_and(|f| !names.iter().any(|n| *n == f.name))
        });
    }
    let rows: Vec<usize> = (0..ds.record_count()).collect();
    let projected = ds.selected(&rows, &cols);
    projected.unwrap_or(ds)
}

/// Looks each `driving` record up in `lookup` and appends the lookup's
/// fields.
///
/// The result has the driving fields followed by the lookup fields, minus
/// the lookup's key fields. When several lookup records share a key the
/// first one is used. Without `outer`, driving records with no match are
/// dropped; with `outer`, they are kept with NULL lookup fields.
///
/// `include` restricts the output to the named fields in the given order,
/// then `exclude` removes the named fields.
///
/// ```rust
/// use std::borrow::Cow;
/// use oxide_etl_core::{relational, DataSet, FieldDef, Record, SqlType, Value};
///
/// let mut orders = DataSet::new("orders").with_fields([
///     FieldDef::new("id", SqlType::Integer),
///     FieldDef::new("customer", SqlType::Integer),
/// ]);
/// orders.add_record(Record::new(vec![Value::Int(1), Value::Int(10)]));
///
/// let mut customers = DataSet::new("customers").with_fields([
///     FieldDef::new("customer", SqlType::Integer),
///     FieldDef::new("name", SqlType::Varchar),
/// ]);
/// customers.add_record(Record::new(vec![Value::Int(10), Value::Text("Ada".into())]));
///
/// let joined = relational::join(
///     Some(&orders),
///     Some(&customers),
///     Some("customer"),
///     false,
///     None,
///     None,
/// )
/// .unwrap();
/// assert!(matches!(joined, Cow::Owned(_)));
/// assert_eq!(joined.field_count(), 3);
/// assert_eq!(joined.field_value_by_name(0, "name"), Some(&Value::Text("Ada".into())));
/// ```
#[must_use]
pub fn join<'a>(
    driving: Option<&'a DataSet>,
    lookup: Option<&DataSet>,
    key: Option<&str>,
    outer: bool,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Option<Cow<'a, DataSet>> {
    let driving = driving?;
    let lookup = match lookup {
        Some(lookup) if !lookup.is_empty() => lookup,
        _ => {
            debug!(dataset = driving.name(), "join with no lookup records, returning driving");
            return Some(Cow::Borrowed(driving));
        }
    };
    if is_blank(key) {
        debug!(dataset = driving.name(), "join without key, returning driving");
        return Some(Cow::Borrowed(driving));
    }
    let (Some(driving_keys), Some(lookup_keys)) =
        (key_indexes(driving, key), key_indexes(lookup, key))
    else {
        debug!(
            driving = driving.name(),
            lookup = lookup.name(),
            key = key.unwrap_or_default(),
            "join key field missing, returning driving"
        );
        return Some(Cow::Borrowed(driving));
    };

    let mut matches: HashMap<String, usize> = HashMap::with_capacity(lookup.record_count());
    for (row, record) in lookup.records().enumerate() {
        if let Some(k) = compose_key(record, &lookup_keys) {
            matches.entry(k).or_insert(row);
        }
    }

    let lookup_cols: Vec<usize> = (0..lookup.field_count())
        .filter(|col| !lookup_keys.contains(col))
        .collect();
    let mut names: HashSet<String> = driving.fields().iter().map(|f| f.name.clone()).collect();
    let lookup_fields: Vec<_> = lookup_cols
        .iter()
        .filter_map(|&c| lookup.field(c))
        .map(|field| {
            let name = unique_name(&mut names, lookup.name(), &field.name);
            if name == field.name {
                field.clone()
            } else {
                debug!(field = %field.name, renamed = %name, "join field name clash");
                field.clone_as(name)
            }
        })
        .collect();
    let fields = driving.fields().iter().cloned().chain(lookup_fields);
    let mut result = driving.empty_with_fields(fields);

    for record in driving.records() {
        let matched = compose_key(record, &driving_keys)
            .and_then(|k| matches.get(&k).copied())
            .and_then(|row| lookup.record(row));
        if matched.is_none() && !outer {
            continue;
        }
        let mut joined = record.clone();
        joined.resize(driving.field_count());
        for &col in &lookup_cols {
            joined.push(matched.and_then(|m| m.cell(col)).cloned().unwrap_or_default());
        }
        result.push_record(joined);
    }
    trace!(dataset = driving.name(), records = result.record_count(), "join done");
    Some(Cow::Owned(project(result, include, exclude)))
}

/// Appends the records of `b` to those of `a`.
///
/// With `all`, every record is kept. Otherwise, with a key, records of `b`
/// whose key already occurred are dropped (records of `a` are all kept, and
/// records with a NULL key part are always kept); without a key, duplicate
/// rows are removed by comparing whole rows.
///
/// The result has the fields of `a`; records of `b` are matched by
/// position. `include` and `exclude` behave as in [`join`].
#[must_use]
pub fn union<'a>(
    a: Option<&'a DataSet>,
    b: Option<&'a DataSet>,
    key: Option<&str>,
    all: bool,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Option<Cow<'a, DataSet>> {
    let (a, b) = match (a, b) {
        (None, None) => return None,
        (Some(only), None) | (None, Some(only)) => {
            debug!(dataset = only.name(), "union with one input, returning it");
            return Some(Cow::Borrowed(only));
        }
        (Some(a), Some(b)) => (a, b),
    };
    let width = a.field_count();
    let mut result = a.empty_like();
    let b_records = b.records().map(|record| {
        let mut record = record.clone();
        record.resize(width);
        record
    });

    if all {
        a.records().cloned().for_each(|r| result.push_record(r));
        b_records.for_each(|r| result.push_record(r));
    } else if is_blank(key) {
        let mut seen = HashSet::new();
        for record in a.records().cloned().chain(b_records) {
            if seen.insert(row_text(&record)) {
                result.push_record(record);
            }
        }
    } else {
        let (Some(a_keys), Some(b_keys)) = (key_indexes(a, key), key_indexes(b, key)) else {
            debug!(
                a = a.name(),
                b = b.name(),
                key = key.unwrap_or_default(),
                "union key field missing, returning first input"
            );
            return Some(Cow::Borrowed(a));
        };
        let mut seen: HashSet<String> = a
            .records()
            .filter_map(|record| compose_key(record, &a_keys))
            .collect();
        a.records().cloned().for_each(|r| result.push_record(r));
        for (record, original) in b_records.zip(b.records()) {
            if let Some(k) = compose_key(original, &b_keys) {
                if !seen.insert(k) {
                    continue;
                }
            }
            result.push_record(record);
        }
    }
    trace!(dataset = a.name(), records = result.record_count(), "union done");
    Some(Cow::Owned(project(result, include, exclude)))
}

/// Keeps the `driving` records whose key does not occur in `subtract`.
///
/// A driving record with a NULL key part is always kept. A missing
/// `subtract` (or an empty one) removes nothing, and the result is still a
/// new DataSet. A blank key, or a key field absent from either input,
/// returns `driving` itself.
#[must_use]
pub fn minus<'a>(
    driving: Option<&'a DataSet>,
    subtract: Option<&DataSet>,
    key: Option<&str>,
) -> Option<Cow<'a, DataSet>> {
    let driving = driving?;
    let subtract = match subtract {
        Some(subtract) if !subtract.is_empty() => subtract,
        _ => return Some(Cow::Owned(driving.clone())),
    };
    let (Some(driving_keys), Some(subtract_keys)) =
        (key_indexes(driving, key), key_indexes(subtract, key))
    else {
        debug!(
            driving = driving.name(),
            subtract = subtract.name(),
            key = key.unwrap_or_default(),
            "minus key missing, returning driving"
        );
        return Some(Cow::Borrowed(driving));
    };

    let removed: HashSet<String> = subtract
        .records()
        .filter_map(|record| compose_key(record, &subtract_keys))
        .collect();
    let mut result = driving.empty_like();
    for record in driving.records() {
        let keep = compose_key(record, &driving_keys).map_or(true, |k| !removed.contains(&k));
        if keep {
            result.push_record(record.clone());
        }
    }
    trace!(dataset = driving.name(), records = result.record_count(), "minus done");
    Some(Cow::Owned(result))
}

/// Groups the records of `ds` by the text of `key`, in first-seen order.
///
/// Records with a NULL key part go to the `None` group, apart from records
/// whose key text is empty. A blank key, or one naming a missing field,
/// puts every record into a single `None` group. An empty DataSet gives an
/// empty map.
#[must_use]
pub fn split(ds: &DataSet, key: Option<&str>) -> IndexMap<Option<String>, DataSet> {
    let mut groups: IndexMap<Option<String>, DataSet> = IndexMap::new();
    if ds.is_empty() {
        return groups;
    }
    let indexes = key_indexes(ds, key);
    if indexes.is_none() && !is_blank(key) {
        debug!(
            dataset = ds.name(),
            key = key.unwrap_or_default(),
            "split key missing, single group"
        );
    }
    for record in ds.records() {
        let group = indexes.as_deref().and_then(|idx| compose_key(record, idx));
        groups
            .entry(group)
            .or_insert_with(|| ds.empty_like())
            .push_record(record.clone());
    }
    trace!(dataset = ds.name(), groups = groups.len(), "split done");
    groups
}

/// Flattens cell versions into extra columns.
///
/// A field whose cells hold up to V versions gets V-1 clones named
/// `<field>_2` .. `<field>_V`, placed right after it; clone `<field>_i`
/// holds version `i-1` of each record, or NULL. The original keeps the
/// primary value and records V as its version count. Fields marked
/// `to_delete` are dropped.
///
/// When there is nothing to flatten or drop, `ds` itself is returned as
/// [`Cow::Borrowed`]. With `remove_original`, `ds` is emptied of fields and
/// records once the result is built; it keeps its name and stays usable.
pub fn denormalize(ds: &mut DataSet, remove_original: bool) -> Cow<'_, DataSet> {
    let plan: Vec<(usize, usize)> = ds
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.to_delete)
        .map(|(col, _)| {
            let versions = ds
                .records()
                .map(|record| record.number_of_versions(col))
                .max()
                .unwrap_or(1)
                .max(1);
            (col, versions)
        })
        .collect();

    if plan.len() == ds.field_count() && plan.iter().all(|&(_, versions)| versions == 1) {
        debug!(dataset = ds.name(), "nothing to denormalize");
        return Cow::Borrowed(&*ds);
    }

    let mut fields = Vec::new();
    for &(col, versions) in &plan {
        let Some(field) = ds.field(col) else { continue };
        let mut original = field.clone();
        original.version = u32::try_from(versions).unwrap_or(u32::MAX);
        fields.push(original);
        for i in 2..=versions {
            fields.push(field.clone_as(format!("{}_{i}", field.name)));
        }
    }
    let mut result = ds.empty_with_fields(fields);

    let flatten = |record: &Record| {
        let mut flat = Record::default();
        for &(col, versions) in &plan {
            for i in 0..versions {
                flat.push(Cell::new(record.version(col, i).cloned().unwrap_or_default()));
            }
        }
        flat
    };
    if remove_original {
        let (_, data) = ds.take_contents();
        data.iter().map(flatten).for_each(|r| result.push_record(r));
    } else {
        ds.records().map(flatten).for_each(|r| result.push_record(r));
    }
    trace!(
        dataset = result.name(),
        fields = result.field_count(),
        records = result.record_count(),
        "denormalize done"
    );
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDef;
    use crate::types::SqlType;
    use crate::value::Value;

    fn people() -> DataSet {
        let mut ds = DataSet::new("people").with_fields([
            FieldDef::new("id", SqlType::Integer),
            FieldDef::new("name", SqlType::Varchar),
            FieldDef::new("dept", SqlType::Integer),
        ]);
        for (id, name, dept) in [
            (1, "ann", Some(10)),
            (2, "bob", Some(20)),
            (3, "cid", None),
            (4, "dan", Some(30)),
        ] {
            ds.add_record(Record::new(vec![
                Value::Int(id),
                Value::Text(name.into()),
                dept.map_or(Value::Null, Value::Int),
            ]));
        }
        ds
    }

    fn depts() -> DataSet {
        let mut ds = DataSet::new("depts").with_fields([
            FieldDef::new("dept", SqlType::Integer),
            FieldDef::new("title", SqlType::Varchar),
        ]);
        for (dept, title) in [(10, "eng"), (20, "ops"), (10, "dup")] {
            ds.add_record(Record::new(vec![Value::Int(dept), Value::Text(title.into())]));
        }
        ds
    }

    fn column(ds: &DataSet, name: &str) -> Vec<Value> {
        (0..ds.record_count())
            .map(|row| ds.field_value_by_name(row, name).cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_inner_join() {
        let (p, d) = (people(), depts());
        let joined = join(Some(&p), Some(&d), Some("dept"), false, None, None).unwrap();
        assert_eq!(joined.field_count(), p.field_count() + d.field_count() - 1);
        assert_eq!(column(&joined, "id"), vec![Value::Int(1), Value::Int(2)]);
        // First lookup match wins.
        assert_eq!(
            column(&joined, "title"),
            vec![Value::Text("eng".into()), Value::Text("ops".into())]
        );
    }

    #[test]
    fn test_outer_join_keeps_unmatched() {
        let (p, d) = (people(), depts());
        let joined = join(Some(&p), Some(&d), Some("dept"), true, None, None).unwrap();
        assert_eq!(joined.record_count(), 4);
        assert_eq!(joined.field_value_by_name(2, "title"), Some(&Value::Null));
        assert_eq!(joined.field_value_by_name(3, "title"), Some(&Value::Null));
    }

    #[test]
    fn test_join_include_exclude() {
        let (p, d) = (people(), depts());
        let joined =
            join(Some(&p), Some(&d), Some("dept"), false, Some("title, id"), None).unwrap();
        let names: Vec<&str> = joined.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "id"]);

        let joined =
            join(Some(&p), Some(&d), Some("dept"), false, None, Some("name,dept")).unwrap();
        let names: Vec<&str> = joined.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title"]);
    }

    #[test]
    fn test_join_short_circuits() {
        let (p, d) = (people(), depts());
        assert!(join(None, Some(&d), Some("dept"), false, None, None).is_none());
        assert!(matches!(
            join(Some(&p), None, Some("dept"), false, None, None),
            Some(Cow::Borrowed(_))
        ));
        assert!(matches!(
            join(Some(&p), Some(&DataSet::new("e")), Some("dept"), false, None, None),
            Some(Cow::Borrowed(_))
        ));
        assert!(matches!(
            join(Some(&p), Some(&d), Some(" "), false, None, None),
            Some(Cow::Borrowed(_))
        ));
        assert!(matches!(
            join(Some(&p), Some(&d), Some("nope"), false, None, None),
            Some(Cow::Borrowed(_))
        ));
    }

    #[test]
    fn test_union_variants() {
        let p = people();
        let mut q = people();
        q.add_record(Record::new(vec![Value::Int(9), Value::Text("eve".into()), Value::Null]));

        let all = union(Some(&p), Some(&q), None, true, None, None).unwrap();
        assert_eq!(all.record_count(), p.record_count() + q.record_count());

        let keyed = union(Some(&p), Some(&q), Some("id"), false, None, None).unwrap();
        assert_eq!(column(&keyed, "id").last(), Some(&Value::Int(9)));
        assert_eq!(keyed.record_count(), 5);

        let rows = union(Some(&p), Some(&q), None, false, None, None).unwrap();
        assert_eq!(rows.record_count(), 5);

        assert!(union(None, None, None, true, None, None).is_none());
        assert!(matches!(union(None, Some(&q), None, true, None, None), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_union_keeps_null_keys() {
        let p = people();
        let keyed = union(Some(&p), Some(&p), Some("dept"), false, None, Some("name")).unwrap();
        // The NULL-dept row of the second input is kept.
        assert_eq!(keyed.record_count(), 5);
        assert_eq!(keyed.field_count(), 2);
    }

    #[test]
    fn test_join_renames_clashing_fields() {
        let p = people();
        let mut d = depts();
        d.add_field(FieldDef::new("name", SqlType::Varchar));
        let joined = join(Some(&p), Some(&d), Some("dept"), true, None, None).unwrap();
        let names: Vec<&str> = joined.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "dept", "title", "depts_name"]);
        assert_eq!(joined.field_value_by_name(0, "name"), Some(&Value::Text("ann".into())));
    }

    #[test]
    fn test_keyed_union_dedups_within_second_input() {
        let p = people();
        let mut q = DataSet::new("more").with_fields([
            FieldDef::new("id", SqlType::Integer),
            FieldDef::new("name", SqlType::Varchar),
            FieldDef::new("dept", SqlType::Integer),
        ]);
        for name in ["fay", "fin"] {
            q.add_record(Record::new(vec![Value::Int(7), Value::Text(name.into()), Value::Null]));
        }
        let keyed = union(Some(&p), Some(&q), Some("id"), false, None, None).unwrap();
        assert_eq!(keyed.record_count(), 5);
        assert_eq!(keyed.field_value_by_name(4, "name"), Some(&Value::Text("fay".into())));
    }

    #[test]
    fn test_minus() {
        let p = people();
        let d = depts();
        let result = minus(Some(&p), Some(&d), Some("dept")).unwrap();
        assert_eq!(column(&result, "id"), vec![Value::Int(3), Value::Int(4)]);
        assert!(matches!(minus(Some(&p), None, Some("dept")), Some(Cow::Owned(_))));
        assert!(matches!(minus(Some(&p), Some(&d), Some("title")), Some(Cow::Borrowed(_))));
        assert!(minus(None, Some(&d), Some("dept")).is_none());
    }

    #[test]
    fn test_split() {
        let mut p = people();
        p.add_record(Record::new(vec![Value::Int(5), Value::Text("eli".into()), Value::Int(10)]));
        let groups = split(&p, Some("dept"));
        let keys: Vec<Option<&str>> = groups.keys().map(Option::as_deref).collect();
        assert_eq!(keys, vec![Some("10"), Some("20"), None, Some("30")]);
        let ten = &groups[&Some("10".to_string())];
        assert_eq!(ten.record_count(), 2);
        assert_eq!(ten.field_count(), 3);

        p.add_record(Record::new(vec![Value::Int(6), Value::Text("flo".into()), Value::Null]));
        let by_name = split(&p, Some("dept"));
        assert_eq!(by_name[&None].record_count(), 2);

        let mut t = DataSet::new("t").with_fields([FieldDef::new("code", SqlType::Varchar)]);
        t.add_record(Record::new(vec![Value::Text(String::new())]));
        t.add_record(Record::new(vec![Value::Null]));
        let groups = split(&t, Some("code"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Some(String::new())].record_count(), 1);
        assert_eq!(groups[&None].record_count(), 1);
        p.delete_record(5).unwrap();

        let single = split(&p, Some("missing"));
        assert_eq!(single.len(), 1);
        assert_eq!(single[&None].record_count(), 5);
        assert!(split(&DataSet::new("e"), Some("dept")).is_empty());
    }

    #[test]
    fn test_denormalize_noop_returns_same() {
        let mut p = people();
        let before = p.clone();
        let result = denormalize(&mut p, false);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(*result, before);
    }

    #[test]
    fn test_denormalize_versions() {
        let mut p = people();
        p.record_mut(0).unwrap().add_version(1, Value::Text("anna".into()));
        p.record_mut(0).unwrap().add_version(1, Value::Text("annie".into()));
        p.record_mut(1).unwrap().add_version(1, Value::Text("rob".into()));
        p.update_field(2, |f| f.to_delete = true).unwrap();

        let result = denormalize(&mut p, false).into_owned();
        let names: Vec<&str> = result.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "name_2", "name_3"]);
        assert_eq!(result.field_by_name("name").unwrap().version, 3);
        assert_eq!(
            column(&result, "name_2"),
            vec![
                Value::Text("anna".into()),
                Value::Text("rob".into()),
                Value::Null,
                Value::Null
            ]
        );
        assert_eq!(result.field_value_by_name(0, "name_3"), Some(&Value::Text("annie".into())));
        assert_eq!(p.record_count(), 4);
    }

    #[test]
    fn test_denormalize_remove_original() {
        let mut p = people();
        p.record_mut(0).unwrap().add_version(0, Value::Int(100));
        let result = denormalize(&mut p, true).into_owned();
        assert_eq!(result.field_count(), 4);
        assert_eq!(result.record_count(), 4);
        assert_eq!(p.field_count(), 0);
        assert_eq!(p.record_count(), 0);
        assert_eq!(p.name(), "people");
    }
}
