//! rdao - runtime for generated data access objects and service clients
//!
//! `rdao-codegen` reads annotated entity structs and service traits and emits
//! DAOs and HTTP clients. The generated code links against this crate.
//!
//! # Features
//!
//! - **Store abstraction**: generated DAOs run SQL through any [`Querier`]
//! - **Cancellation**: every call takes a [`Context`] carrying a cancel signal and deadline
//! - **Predicates**: [`Criteria`] fragments composed into `WHERE` clauses, [`Page`] for pagination
//! - **Partial writes**: [`IsZero`] drives the `*_none_zero` operations
//! - **Derive macros**: `#[derive(FromRow)]` with support for flattened embedded structs
//! - **HTTP clients**: the [`client`] module (feature `client`, on by default)
//!
//! # Example
//!
//! ```ignore
//! use rdao::{Context, Criteria, FromRow, Page};
//!
//! #[derive(FromRow)]
//! #[rdao(table = "user")]
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//!     #[rdao(flatten)]
//!     pub base: Base,
//! }
//!
//! async fn adults(dao: &dao::user::UserDao<MyPool>) -> rdao::Result<()> {
//!     let ctx = Context::background();
//!     let page = dao
//!         .page_many(&ctx, &Page::new(1, 20), &[Criteria::gte("age", 18)])
//!         .await?;
//!     println!("{} of {}", page.items.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod error;
pub mod predicate;
pub mod query;
pub mod sql;
pub mod traits;
pub mod value;

#[cfg(feature = "client")]
pub mod client;

// Re-export the macros
pub use rdao_derive::{service, FromRow};

// Re-export main types
pub use context::{CancelHandle, Context, Interrupted};
pub use error::{Error, Result, ResultExt};
pub use predicate::{compose, filter, has_next, Criteria, Direction, Order, Page, PageRet};
pub use query::Query;
pub use traits::{
    from_json, ExecuteResult, FromRow, FromValue, HasPrimaryKey, IsZero, Querier, Row, RowExt,
    ToValue, ValueRow,
};
pub use value::{to_json, Value};
