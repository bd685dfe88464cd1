//! Core traits for rdao

mod entity;
mod from_row;
mod from_value;
mod is_zero;
mod querier;
mod to_value;

pub use entity::HasPrimaryKey;
pub use from_row::{FromRow, Row, RowExt, ValueRow};
pub use from_value::{from_json, FromValue};
pub use is_zero::IsZero;
pub use querier::{ExecuteResult, Querier};
pub use to_value::ToValue;
