//! Store-handle abstraction consumed by generated DAOs

use std::sync::Arc;

use crate::error::Result;
use crate::traits::{FromRow, FromValue};
use crate::value::Value;
use async_trait::async_trait;

/// Result of a write statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Number of rows affected by the statement
    pub rows_affected: u64,
    /// Key generated by an INSERT, when the driver reports one
    pub last_insert_id: Option<u64>,
}

/// A handle that can run parameterized SQL.
///
/// Statements use `?` placeholders bound positionally from `params`.
/// Connection pooling and the wire protocol live behind this trait; the
/// caller's [`Context`](crate::Context) is enforced by [`Query`](crate::Query),
/// which abandons the returned future on cancellation.
#[async_trait]
pub trait Querier: Send + Sync {
    /// Execute a write statement.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<ExecuteResult>;

    /// Fetch all rows matching the query.
    async fn fetch_all<T: FromRow + Send>(&self, sql: &str, params: Vec<Value>) -> Result<Vec<T>>;

    /// Fetch at most one row.
    async fn fetch_optional<T: FromRow + Send>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>>;

    /// Fetch the first column of the first row.
    async fn fetch_scalar<T: FromValue + Send>(&self, sql: &str, params: Vec<Value>)
        -> Result<T>;
}

#[async_trait]
impl<Q: Querier + ?Sized> Querier for Arc<Q> {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<ExecuteResult> {
        (**self).execute(sql, params).await
    }

    async fn fetch_all<T: FromRow + Send>(&self, sql: &str, params: Vec<Value>) -> Result<Vec<T>> {
        (**self).fetch_all(sql, params).await
    }

    async fn fetch_optional<T: FromRow + Send>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>> {
        (**self).fetch_optional(sql, params).await
    }

    async fn fetch_scalar<T: FromValue + Send>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        (**self).fetch_scalar(sql, params).await
    }
}
