//! Predicate fragments, WHERE composition and pagination

use serde::{Deserialize, Serialize};

use crate::query::Query;
use crate::traits::ToValue;
use crate::value::Value;

/// A SQL predicate fragment with its bound parameters.
///
/// Fragments are plain text with `?` placeholders. Column builders quote the
/// column name with backticks; [`Criteria::raw`] passes text through
/// untouched, which is how connectors between composed fragments are written.
///
/// ```ignore
/// let adults = Criteria::gte("age", 18).and(Criteria::is_not_null("email"));
/// dao.select_many(&ctx, &[adults, Criteria::raw("or", vec![]), Criteria::eq("vip", true)]).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    sql: String,
    params: Vec<Value>,
}

fn quote(column: &str) -> String {
    format!("`{}`", column.replace('`', "``"))
}

impl Criteria {
    /// A fragment taken verbatim.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    fn compare(column: &str, op: &str, value: impl ToValue) -> Self {
        Self {
            sql: format!("{} {} ?", quote(column), op),
            params: vec![value.to_value()],
        }
    }

    pub fn eq(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, "=", value)
    }

    pub fn ne(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, "!=", value)
    }

    pub fn gt(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, ">", value)
    }

    pub fn gte(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, ">=", value)
    }

    pub fn lt(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, "<", value)
    }

    pub fn lte(column: &str, value: impl ToValue) -> Self {
        Self::compare(column, "<=", value)
    }

    pub fn like(column: &str, pattern: impl ToValue) -> Self {
        Self::compare(column, "LIKE", pattern)
    }

    /// `column IN (?, ...)`. An empty list matches nothing.
    pub fn in_list<T: ToValue>(column: &str, values: &[T]) -> Self {
        if values.is_empty() {
            return Self::raw("1 = 0", Vec::new());
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        Self {
            sql: format!("{} IN ({})", quote(column), placeholders),
            params: values.iter().map(ToValue::to_value).collect(),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self::raw(format!("{} IS NULL", quote(column)), Vec::new())
    }

    pub fn is_not_null(column: &str) -> Self {
        Self::raw(format!("{} IS NOT NULL", quote(column)), Vec::new())
    }

    /// `(self AND other)`
    pub fn and(self, other: Criteria) -> Self {
        self.join("AND", other)
    }

    /// `(self OR other)`
    pub fn or(self, other: Criteria) -> Self {
        self.join("OR", other)
    }

    fn join(mut self, connector: &str, other: Criteria) -> Self {
        self.sql = format!("({} {} {})", self.sql, connector, other.sql);
        self.params.extend(other.params);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

/// Append `WHERE` and the fragments, space-joined in caller order.
///
/// No fragments means no `WHERE` at all.
pub fn compose(base: &str, predicates: &[Criteria]) -> Query {
    filter(Query::new(base), predicates)
}

/// [`compose`] onto a query that already carries bound parameters, such as
/// the `SET` list of a bulk update.
pub fn filter(query: Query, predicates: &[Criteria]) -> Query {
    let mut query = query;
    if predicates.is_empty() {
        return query;
    }
    query = query.push_sql("WHERE");
    for predicate in predicates {
        query = query
            .push_sql(&predicate.sql)
            .bind_all(predicate.params.iter().cloned());
    }
    query
}

/// Sort direction for [`Page`] ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A page request: 1-based page number, page size and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_no: u64,
    pub size: u64,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Page {
    /// Page numbers start at 1; `0` is treated as the first page.
    pub fn new(page_no: u64, size: u64) -> Self {
        Self {
            page_no: page_no.max(1),
            size,
            orders: Vec::new(),
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn offset(&self) -> u64 {
        self.page_no.max(1).saturating_sub(1).saturating_mul(self.size)
    }

    /// `ORDER BY ... LIMIT offset,size`
    pub fn sql(&self) -> String {
        let mut sql = String::new();
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", quote(&o.column), dir)
                })
                .collect();
            sql.push_str("ORDER BY ");
            sql.push_str(&orders.join(", "));
            sql.push(' ');
        }
        sql.push_str(&format!("LIMIT {},{}", self.offset(), self.size));
        sql
    }
}

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRet<T> {
    pub items: Vec<T>,
    pub page_no: u64,
    pub page_size: u64,
    pub total: u64,
    pub has_next: bool,
}

impl<T> PageRet<T> {
    pub fn new(items: Vec<T>, page: &Page, total: u64) -> Self {
        Self {
            items,
            page_no: page.page_no,
            page_size: page.size,
            total,
            has_next: has_next(total, page.size, page.page_no),
        }
    }
}

/// `ceil(total / page_size) > page_no`. A zero page size has no next page.
pub fn has_next(total: u64, page_size: u64, page_no: u64) -> bool {
    if page_size == 0 {
        return false;
    }
    total.div_ceil(page_size) > page_no
}
