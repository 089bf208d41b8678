//! Postgres implementation of the query gateway.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{Assignments, Datastore, Filter, FilterOp, Row, SelectQuery, StoreValue};

/// Query gateway backed by a Postgres pool.
///
/// Rows are shipped as JSON (`to_jsonb` / `jsonb_build_object`) so the
/// gateway stays generic over tables without per-table row mappings.
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration and wrap it.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url)
            .await
            .map_err(map_sqlx_err)?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            if code == "23505" {
                return StoreError::UniqueViolation;
            }
            if code == "23503" {
                return StoreError::ForeignKeyViolation(db.message().to_string());
            }
        }
    }
    StoreError::Unavailable(err.to_string())
}

/// Push one bound scalar. NULL is pushed as a literal so the parameter type
/// never fights the target column type.
fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &StoreValue) {
    match value {
        StoreValue::Uuid(u) => {
            qb.push_bind(*u);
        }
        StoreValue::Text(s) => {
            qb.push_bind(s.clone());
        }
        StoreValue::Int(i) => {
            qb.push_bind(*i);
        }
        StoreValue::Bool(b) => {
            qb.push_bind(*b);
        }
        StoreValue::Timestamp(t) => {
            qb.push_bind(*t);
        }
        StoreValue::Null => {
            qb.push("NULL");
        }
    }
}

/// Push an `IN`-style predicate as `column = ANY($n)`. The bound array must
/// be homogeneous; an empty set matches nothing.
fn push_any(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    values: &[StoreValue],
) -> StoreResult<()> {
    if values.is_empty() {
        qb.push("FALSE");
        return Ok(());
    }

    if values.iter().all(|v| matches!(v, StoreValue::Uuid(_))) {
        let items: Vec<Uuid> = values
            .iter()
            .map(|v| match v {
                StoreValue::Uuid(u) => *u,
                _ => unreachable!(),
            })
            .collect();
        qb.push(column).push(" = ANY(").push_bind(items).push(")");
        return Ok(());
    }

    if values.iter().all(|v| matches!(v, StoreValue::Text(_))) {
        let items: Vec<String> = values
            .iter()
            .map(|v| match v {
                StoreValue::Text(s) => s.clone(),
                _ => unreachable!(),
            })
            .collect();
        qb.push(column).push(" = ANY(").push_bind(items).push(")");
        return Ok(());
    }

    if values.iter().all(|v| matches!(v, StoreValue::Int(_))) {
        let items: Vec<i64> = values
            .iter()
            .map(|v| match v {
                StoreValue::Int(i) => *i,
                _ => unreachable!(),
            })
            .collect();
        qb.push(column).push(" = ANY(").push_bind(items).push(")");
        return Ok(());
    }

    Err(StoreError::Unsupported(format!(
        "heterogeneous IN list on column {column}"
    )))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) -> StoreResult<()> {
    if filters.is_empty() {
        return Ok(());
    }

    qb.push(" WHERE ");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        match &filter.op {
            FilterOp::Eq(value) => match value {
                StoreValue::Null => {
                    qb.push(&filter.column).push(" IS NULL");
                }
                other => {
                    qb.push(&filter.column).push(" = ");
                    push_value(qb, other);
                }
            },
            FilterOp::In(values) => push_any(qb, &filter.column, values)?,
            FilterOp::IsNull => {
                qb.push(&filter.column).push(" IS NULL");
            }
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl Datastore for PgDatastore {
    async fn select(&self, query: SelectQuery) -> StoreResult<Vec<Row>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        match &query.columns {
            Some(columns) => {
                qb.push("jsonb_build_object(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    qb.push(format!("'{column}', t.{column}"));
                }
                qb.push(")");
            }
            None => {
                qb.push("to_jsonb(t)");
            }
        }
        qb.push(" FROM ").push(&query.table).push(" t");

        push_filters(&mut qb, &query.filters)?;

        if let Some(order) = &query.order {
            qb.push(" ORDER BY ").push(&order.column);
            qb.push(if order.descending { " DESC" } else { " ASC" });
        }
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let values: Vec<serde_json::Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::Object(map) => Ok(map),
                other => Err(StoreError::Unsupported(format!(
                    "non-object row from {}: {other}",
                    query.table
                ))),
            })
            .collect()
    }

    async fn insert(&self, table: &str, row: Assignments) -> StoreResult<Row> {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(table).push(" AS t (");
        for (i, (column, _)) in row.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in row.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING to_jsonb(t)");

        let value: serde_json::Value = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(StoreError::Unsupported(format!(
                "non-object row from {table}: {other}"
            ))),
        }
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Assignments,
    ) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(table).push(" SET ");
        for (i, (column, value)) in changes.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column).push(" = ");
            push_value(&mut qb, value);
        }
        push_filters(&mut qb, filters)?;

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(table);
        push_filters(&mut qb, filters)?;

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        qb.push(table).push(" t");
        push_filters(&mut qb, filters)?;

        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }
}
