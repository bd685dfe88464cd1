//! Declaration parsing: Rust source units to entity and interface metadata

mod extractor;
mod metadata;
mod semantic;

pub use extractor::{Extraction, Extractor};
pub use metadata::*;
pub use semantic::{resolve, type_to_string, BUILTIN_COMPOSITES};
