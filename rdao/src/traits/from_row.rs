//! FromRow trait for mapping rows to entity structs

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// A result row that can be queried by column name.
pub trait Row {
    /// Get a value from the row by column name.
    ///
    /// Returns an error if the column doesn't exist.
    fn get_value(&self, column: &str) -> Result<Value>;
}

/// Extension trait for typed access to row values.
pub trait RowExt: Row {
    /// Get a typed value from the row by column name.
    fn get<T: crate::FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get_value(column)?)
    }

    /// Decode a JSON column into any deserializable type.
    fn get_json<T: serde::de::DeserializeOwned>(&self, column: &str) -> Result<T> {
        crate::from_json(self.get_value(column)?)
    }
}

impl<R: Row + ?Sized> RowExt for R {}

/// Trait for types that can be constructed from a row.
///
/// Usually derived with `#[derive(FromRow)]`. Embedded structs marked
/// `#[rdao(flatten)]` read their columns from the same row, matching the
/// flattened column list the generator produces.
pub trait FromRow: Sized {
    /// Construct an instance of this type from a row.
    fn from_row<R: Row + ?Sized>(row: &R) -> Result<Self>;
}

/// A row backed by an owned column map.
///
/// Drivers can decode into this shape, and tests use it to feed canned
/// rows through a [`Querier`](crate::Querier).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    values: HashMap<String, Value>,
}

impl ValueRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ValueRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Row for ValueRow {
    fn get_value(&self, column: &str) -> Result<Value> {
        self.values
            .get(column)
            .cloned()
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_row_typed_access() {
        let row = ValueRow::new()
            .with("id", 3_i64)
            .with("name", "ann")
            .with("tags", Value::String(r#"["x"]"#.into()));
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("name").unwrap(), "ann");
        assert_eq!(row.get_json::<Vec<String>>("tags").unwrap(), vec!["x"]);
        assert!(matches!(
            row.get::<i64>("missing"),
            Err(Error::ColumnNotFound(c)) if c == "missing"
        ));
    }
}
