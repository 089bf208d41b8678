//! Query gateway over the relational store.
//!
//! Every engine component talks to storage through the [`Datastore`] trait:
//! filtered select (with projection, ordering, limit), insert, update,
//! delete and count over named tables, with rows travelling as JSON
//! objects. Two implementations exist: [`PgDatastore`] (sqlx/Postgres) for
//! production and [`MemoryDatastore`] for tests and local development.
//!
//! Table and column names come from repository constants, never from caller
//! input; the gateway does not validate identifiers.

mod memory;
mod postgres;

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// A row as returned by the gateway.
pub type Row = serde_json::Map<String, Value>;

/// A typed scalar bound into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Uuid(Uuid),
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl StoreValue {
    /// JSON representation, as stored by the in-memory tables and as
    /// produced by `to_jsonb` on the Postgres side.
    pub fn to_json(&self) -> Value {
        match self {
            StoreValue::Uuid(u) => Value::String(u.to_string()),
            StoreValue::Text(s) => Value::String(s.clone()),
            StoreValue::Int(i) => Value::from(*i),
            StoreValue::Bool(b) => Value::Bool(*b),
            StoreValue::Timestamp(t) => Value::String(t.to_rfc3339()),
            StoreValue::Null => Value::Null,
        }
    }
}

impl From<Uuid> for StoreValue {
    fn from(value: Uuid) -> Self {
        StoreValue::Uuid(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        StoreValue::Text(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        StoreValue::Text(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        StoreValue::Int(value)
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        StoreValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for StoreValue {
    fn from(value: DateTime<Utc>) -> Self {
        StoreValue::Timestamp(value)
    }
}

impl<T: Into<StoreValue>> From<Option<T>> for StoreValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => StoreValue::Null,
        }
    }
}

/// A single filter predicate.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

#[derive(Debug, Clone)]
pub enum FilterOp {
    Eq(StoreValue),
    In(Vec<StoreValue>),
    IsNull,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<StoreValue>) -> Self {
        Filter {
            column: column.to_string(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn is_in(column: &str, values: impl IntoIterator<Item = impl Into<StoreValue>>) -> Self {
        Filter {
            column: column.to_string(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Filter {
            column: column.to_string(),
            op: FilterOp::IsNull,
        }
    }
}

/// Ordering clause.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Column/value assignments for inserts and updates.
pub type Assignments = Vec<(String, StoreValue)>;

/// A filtered select over one table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub table: String,
    /// Projection; `None` selects the full row.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<i64>,
}

impl SelectQuery {
    pub fn from(table: &str) -> Self {
        SelectQuery {
            table: table.to_string(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Uniform interface to the relational store.
///
/// Every method returns a `Result` rather than panicking; callers decide
/// whether a failure degrades to defaults or propagates.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    /// Filtered select.
    async fn select(&self, query: SelectQuery) -> StoreResult<Vec<Row>>;

    /// Insert one row, returning it as stored.
    async fn insert(&self, table: &str, row: Assignments) -> StoreResult<Row>;

    /// Update matching rows, returning the affected count.
    async fn update(&self, table: &str, filters: &[Filter], changes: Assignments)
        -> StoreResult<u64>;

    /// Delete matching rows, returning the affected count.
    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<u64>;

    /// Count matching rows.
    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<i64>;

    /// First matching row, if any.
    async fn select_one(&self, query: SelectQuery) -> StoreResult<Option<Row>> {
        let rows = self.select(query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }
}

/// Decode a gateway row into a typed struct.
pub fn decode<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(StoreError::Decode)
}

/// Decode a batch of gateway rows.
pub fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}
