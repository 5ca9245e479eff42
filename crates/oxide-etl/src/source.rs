//! Reading query results from SQLite into a DataSet.

use anyhow::Context;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteColumn, SqlitePool, SqliteRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use oxide_etl_core::sql_utils::{
    populate_data_set, scale_and_precision, ColumnMeta, PopulateOptions, VecResultSet,
};
use oxide_etl_core::driver::SqliteDriver;
use oxide_etl_core::{DataSet, SqlType, Value};

/// What to read and how to shape the DataSet.
#[derive(Debug, Clone, Default)]
pub struct SourceQuery {
    /// Query to run against the source database.
    pub query: String,
    /// DataSet and table name.
    pub table: String,
    /// Comma-delimited key fields.
    pub key: Option<String>,
    /// Filter expression applied while rows are added.
    pub filter: Option<String>,
    /// Population options.
    pub options: PopulateOptions,
}

fn column_meta(column: &SqliteColumn) -> ColumnMeta {
    let type_name = column.type_info().name().to_string();
    let mut meta = ColumnMeta::new(column.name(), SqlType::from_native(&type_name));
    if let Some((precision, scale)) = scale_and_precision(&type_name) {
        meta.precision = Some(precision);
        meta.scale = scale.and_then(|s| i32::try_from(s).ok());
    }
    meta.type_name = type_name;
    meta
}

fn row_values(row: &SqliteRow) -> Result<Vec<Value>, sqlx::Error> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Value::Null);
            }
            let storage = raw.type_info().name().to_string();
            let value = match storage.as_str() {
                "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => Value::Float(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => Value::Text(row.try_get_unchecked::<String, _>(i)?),
            };
            Ok(value)
        })
        .collect()
}

/// Runs `query` and buffers at most `limit` rows of its result, streaming
/// them so that the rest of the result is never read.
pub async fn fetch(
    pool: &SqlitePool,
    query: &str,
    limit: Option<usize>,
) -> anyhow::Result<VecResultSet> {
    let mut columns: Option<Vec<ColumnMeta>> = None;
    let mut values = Vec::new();
    {
        let mut rows = sqlx::query(query).fetch(pool);
        while limit.map_or(true, |max| values.len() < max) {
            let Some(row) = rows
                .try_next()
                .await
                .with_context(|| format!("query failed: {query}"))?
            else {
                break;
            };
            if columns.is_none() {
                columns = Some(row.columns().iter().map(column_meta).collect());
            }
            values.push(row_values(&row)?);
        }
    }
    let columns = match columns {
        Some(columns) => columns,
        None => pool
            .describe(query)
            .await
            .with_context(|| format!("query failed: {query}"))?
            .columns()
            .iter()
            .map(column_meta)
            .collect(),
    };
    debug!(columns = columns.len(), rows = values.len(), "query fetched");
    Ok(VecResultSet::new(columns, values))
}

/// Rows worth reading for `request`: the row cap when every fetched row is
/// kept, else everything.
fn fetch_limit(request: &SourceQuery) -> Option<usize> {
    let options = &request.options;
    let keeps_every_row = request.filter.is_none()
        && !options.unique
        && !options.check_key_field
        && options.filter_by_field.is_none();
    options.max_rows.filter(|_| keeps_every_row)
}

/// Runs the source query and populates a DataSet from it.
pub async fn load(pool: &SqlitePool, request: &SourceQuery) -> anyhow::Result<DataSet> {
    let mut result = fetch(pool, &request.query, fetch_limit(request)).await?;
    let mut ds = DataSet::new(request.table.as_str());
    ds.set_key_fields(request.key.as_deref());
    ds.set_filter(request.filter.as_deref())?;
    let added = populate_data_set(&mut ds, &SqliteDriver, &mut result, &request.options)?;
    info!(table = %request.table, records = added, "data set loaded");
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        for sql in [
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL, born DATE, avatar BLOB)",
            "INSERT INTO users VALUES (1, 'Ada', 9.5, '1815-12-10', x'0102')",
            "INSERT INTO users VALUES (2, 'O''Brien', NULL, NULL, NULL)",
            "INSERT INTO users VALUES (3, 'Ada', 7.0, '1990-01-31', NULL)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }
        pool
    }

    fn request_for(query: &str) -> SourceQuery {
        SourceQuery {
            query: query.to_string(),
            table: "users".to_string(),
            ..SourceQuery::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_types_and_values() {
        let pool = create_test_pool().await;
        let result = fetch(&pool, "SELECT id, name, score, avatar FROM users ORDER BY id", None)
            .await
            .unwrap();
        let ds = {
            let mut ds = DataSet::new("users");
            let mut result = result;
            populate_data_set(&mut ds, &SqliteDriver, &mut result, &PopulateOptions::default())
                .unwrap();
            ds
        };
        assert_eq!(ds.field_count(), 4);
        assert_eq!(ds.field(0).unwrap().sql_type, SqlType::Integer);
        assert_eq!(ds.field(2).unwrap().sql_type, SqlType::Real);
        assert_eq!(ds.field_value(0, 3), Some(&Value::Bytes(vec![1, 2])));
        assert_eq!(ds.field_value(1, 1), Some(&Value::Text("O'Brien".into())));
        assert_eq!(ds.field_value(1, 2), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_fetch_empty_result_keeps_columns() {
        let pool = create_test_pool().await;
        let result = fetch(&pool, "SELECT id, name FROM users WHERE id < 0", None).await.unwrap();
        let mut ds = DataSet::new("users");
        let mut result = result;
        populate_data_set(&mut ds, &SqliteDriver, &mut result, &PopulateOptions::default())
            .unwrap();
        assert_eq!(ds.field_count(), 2);
        assert!(ds.is_empty());
    }

    #[tokio::test]
    async fn test_load_with_filter_and_cap() {
        let pool = create_test_pool().await;
        let mut s = request_for("SELECT id, name FROM users ORDER BY id");
        s.filter = Some("id >= 2".to_string());
        let ds = load(&pool, &s).await.unwrap();
        assert_eq!(ds.record_count(), 2);

        let mut s = request_for("SELECT name FROM users ORDER BY id");
        s.options.unique = true;
        let ds = load(&pool, &s).await.unwrap();
        assert_eq!(ds.record_count(), 2);

        let mut s = request_for("SELECT id FROM users");
        s.options.max_rows = Some(1);
        let ds = load(&pool, &s).await.unwrap();
        assert_eq!(ds.record_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_stops_at_limit() {
        let pool = create_test_pool().await;
        let mut result = fetch(&pool, "SELECT id, name FROM users ORDER BY id", Some(2))
            .await
            .unwrap();
        let mut ds = DataSet::new("users");
        populate_data_set(&mut ds, &SqliteDriver, &mut result, &PopulateOptions::default())
            .unwrap();
        assert_eq!(ds.record_count(), 2);

        let mut shape = fetch(&pool, "SELECT id, name FROM users", Some(0)).await.unwrap();
        let mut ds = DataSet::new("users");
        populate_data_set(&mut ds, &SqliteDriver, &mut shape, &PopulateOptions::default())
            .unwrap();
        assert_eq!(ds.field_count(), 2);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_fetch_limit_only_when_rows_are_kept() {
        let mut request = request_for("SELECT id FROM users");
        request.options.max_rows = Some(3);
        assert_eq!(fetch_limit(&request), Some(3));
        request.filter = Some("id > 1".to_string());
        assert_eq!(fetch_limit(&request), None);
        request.filter = None;
        request.options.unique = true;
        assert_eq!(fetch_limit(&request), None);
    }

    #[tokio::test]
    async fn test_bad_query_reports_context() {
        let pool = create_test_pool().await;
        let err = fetch(&pool, "SELECT nope FROM missing", None).await.unwrap_err();
        assert!(err.to_string().contains("query failed"));
    }
}
