//! In-memory implementation of the query gateway.
//!
//! Backs the unit and integration suites, and doubles as a local
//! development store. Tables keep rows in insertion order as JSON objects,
//! the same shape the Postgres gateway ships. Unique indexes and foreign
//! keys are declared per table so constraint-violation paths (duplicate
//! reactions, dangling post references) behave like the real store, and
//! individual tables can be failed to exercise degradation paths.

use chrono::DateTime;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::cmp::Ordering;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::{Assignments, Datastore, Filter, FilterOp, Row, SelectQuery};

#[derive(Default)]
struct TableDef {
    /// Column sets that must be unique across rows.
    unique: Vec<Vec<String>>,
    /// (column, referenced table) pairs; the referenced table's `id` column
    /// must contain the value.
    foreign: Vec<(String, String)>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    defs: HashMap<String, TableDef>,
    failing: HashSet<String>,
}

/// In-memory query gateway.
#[derive(Default)]
pub struct MemoryDatastore {
    inner: Mutex<Inner>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique index over `columns` for `table`.
    pub async fn declare_unique(&self, table: &str, columns: &[&str]) {
        let mut inner = self.inner.lock().await;
        inner
            .defs
            .entry(table.to_string())
            .or_default()
            .unique
            .push(columns.iter().map(|c| c.to_string()).collect());
    }

    /// Declare that `table.column` references `ref_table.id`.
    pub async fn declare_foreign_key(&self, table: &str, column: &str, ref_table: &str) {
        let mut inner = self.inner.lock().await;
        inner
            .defs
            .entry(table.to_string())
            .or_default()
            .foreign
            .push((column.to_string(), ref_table.to_string()));
    }

    /// Make every operation on `table` fail until healed.
    pub async fn fail_table(&self, table: &str) {
        let mut inner = self.inner.lock().await;
        inner.failing.insert(table.to_string());
    }

    pub async fn heal_table(&self, table: &str) {
        let mut inner = self.inner.lock().await;
        inner.failing.remove(table);
    }

    /// Number of rows currently in `table`.
    pub async fn table_len(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }
}

fn check_available(inner: &Inner, table: &str) -> StoreResult<()> {
    if inner.failing.contains(table) {
        return Err(StoreError::Unavailable(format!(
            "table {table} is unavailable"
        )));
    }
    Ok(())
}

fn row_value<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let actual = row_value(row, &filter.column);
        match &filter.op {
            FilterOp::Eq(expected) => {
                let expected = expected.to_json();
                if expected.is_null() {
                    actual.is_null()
                } else {
                    *actual == expected
                }
            }
            FilterOp::In(values) => values.iter().any(|v| *actual == v.to_json()),
            FilterOp::IsNull => actual.is_null(),
        }
    })
}

/// Order two JSON scalars. Timestamp strings compare chronologically,
/// everything else by its natural scalar order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(row: &Row, columns: &Option<Vec<String>>) -> Row {
    match columns {
        None => row.clone(),
        Some(columns) => columns
            .iter()
            .map(|c| (c.clone(), row_value(row, c).clone()))
            .collect(),
    }
}

#[async_trait::async_trait]
impl Datastore for MemoryDatastore {
    async fn select(&self, query: SelectQuery) -> StoreResult<Vec<Row>> {
        let inner = self.inner.lock().await;
        check_available(&inner, &query.table)?;

        let mut rows: Vec<Row> = inner
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(row_value(a, &order.column), row_value(b, &order.column));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }

        Ok(rows.iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn insert(&self, table: &str, row: Assignments) -> StoreResult<Row> {
        let mut inner = self.inner.lock().await;
        check_available(&inner, table)?;

        let new_row: Row = row
            .into_iter()
            .map(|(column, value)| (column, value.to_json()))
            .collect();

        if let Some(def) = inner.defs.get(table) {
            for (column, ref_table) in &def.foreign {
                let value = row_value(&new_row, column);
                if value.is_null() {
                    continue;
                }
                let exists = inner
                    .tables
                    .get(ref_table)
                    .map(|rows| rows.iter().any(|r| row_value(r, "id") == value))
                    .unwrap_or(false);
                if !exists {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "{table}.{column} references missing {ref_table} row"
                    )));
                }
            }

            let existing = inner.tables.get(table);
            for columns in &def.unique {
                let duplicate = existing
                    .map(|rows| {
                        rows.iter().any(|r| {
                            columns
                                .iter()
                                .all(|c| row_value(r, c) == row_value(&new_row, c))
                        })
                    })
                    .unwrap_or(false);
                if duplicate {
                    return Err(StoreError::UniqueViolation);
                }
            }
        }

        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(new_row.clone());
        Ok(new_row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Assignments,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        check_available(&inner, table)?;

        let changes: Vec<(String, Value)> = changes
            .into_iter()
            .map(|(column, value)| (column, value.to_json()))
            .collect();

        let mut affected = 0u64;
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, filters)) {
                for (column, value) in &changes {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        check_available(&inner, table)?;

        let mut affected = 0u64;
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|row| {
                if matches(row, filters) {
                    affected += 1;
                    false
                } else {
                    true
                }
            });
        }
        Ok(affected)
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        check_available(&inner, table)?;

        Ok(inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| matches(row, filters)).count())
            .unwrap_or(0) as i64)
    }
}
