//! Schema normalization: flattening and storage types

mod flatten;
mod table;

pub use flatten::flatten;
pub use table::{Column, Table};
