//! Query builder for rdao

use crate::context::Context;
use crate::error::Result;
use crate::traits::{ExecuteResult, FromRow, FromValue, Querier, ToValue};
use crate::value::Value;

/// A SQL statement with positionally bound parameters.
///
/// Every terminal method takes the caller's [`Context`] and abandons the
/// store call with [`Error::Cancelled`](crate::Error::Cancelled) or
/// [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) when the
/// context stops first.
///
/// # Example
///
/// ```ignore
/// use rdao::{Context, Query, Querier};
///
/// async fn find_user(ctx: &Context, db: &impl Querier, id: i64) -> rdao::Result<Option<User>> {
///     Query::new("SELECT `id`, `name` FROM `user` WHERE `id` = ?")
///         .bind(id)
///         .fetch_optional(ctx, db)
///         .await
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
}

impl Query {
    /// Create a new query with the given SQL.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a single value to the next `?` placeholder.
    pub fn bind<T: ToValue>(mut self, value: T) -> Self {
        self.params.push(value.to_value());
        self
    }

    /// Bind already converted values in order.
    pub fn bind_all(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.params.extend(values);
        self
    }

    /// Append a SQL fragment, separated by a single space.
    pub fn push_sql(mut self, fragment: &str) -> Self {
        if !fragment.is_empty() {
            if !self.sql.is_empty() {
                self.sql.push(' ');
            }
            self.sql.push_str(fragment);
        }
        self
    }

    /// Get the SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the bound parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Execute the statement.
    pub async fn execute<Q: Querier>(self, ctx: &Context, db: &Q) -> Result<ExecuteResult> {
        ctx.run(db.execute(&self.sql, self.params)).await?
    }

    /// Fetch all matching rows.
    pub async fn fetch_all<T, Q>(self, ctx: &Context, db: &Q) -> Result<Vec<T>>
    where
        T: FromRow + Send,
        Q: Querier,
    {
        ctx.run(db.fetch_all(&self.sql, self.params)).await?
    }

    /// Fetch at most one row.
    pub async fn fetch_optional<T, Q>(self, ctx: &Context, db: &Q) -> Result<Option<T>>
    where
        T: FromRow + Send,
        Q: Querier,
    {
        ctx.run(db.fetch_optional(&self.sql, self.params)).await?
    }

    /// Fetch a scalar value (first column of first row).
    pub async fn fetch_scalar<T, Q>(self, ctx: &Context, db: &Q) -> Result<T>
    where
        T: FromValue + Send,
        Q: Querier,
    {
        ctx.run(db.fetch_scalar(&self.sql, self.params)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_sql_spacing() {
        let q = Query::new("SELECT 1").push_sql("").push_sql("LIMIT 1");
        assert_eq!(q.sql(), "SELECT 1 LIMIT 1");
        assert_eq!(Query::default().push_sql("x").sql(), "x");
    }

    #[test]
    fn test_bind_order() {
        let q = Query::new("?, ?, ?")
            .bind(1_i32)
            .bind("a")
            .bind_all([Value::Null]);
        assert_eq!(
            q.params(),
            &[Value::I32(1), Value::String("a".into()), Value::Null]
        );
    }
}
