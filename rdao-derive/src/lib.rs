//! Macros for the rdao runtime
//!
//! - `FromRow` maps rows to entity structs, including flattened embedded structs
//! - `#[service]` lets service traits carry `#[rdao(...)]` annotations
//!
//! Both are re-exported from the `rdao` crate, so users typically
//! don't need to depend on this crate directly.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemTrait};

mod from_row;
mod service;

/// Derive macro for mapping rows to Rust structs.
///
/// # Attributes
///
/// - `#[rdao(table)]` / `#[rdao(table = "name")]` on the struct marks it as a table for `rdao-codegen`
/// - `#[rdao(rename = "column_name")]` - read a different column
/// - `#[rdao(skip)]` - not stored; filled with `Default::default()`
/// - `#[rdao(json)]` - stored as a JSON column and decoded with serde
/// - `#[rdao(flatten)]` (or `#[serde(flatten)]`) - embedded struct read from the same row
/// - `#[rdao(pk)]`, `#[rdao(column_type = "..")]` - accepted for `rdao-codegen`
///
/// # Example
///
/// ```ignore
/// use rdao::FromRow;
///
/// #[derive(FromRow)]
/// #[rdao(table = "user")]
/// pub struct User {
///     pub id: i64,
///     #[rdao(rename = "user_name")]
///     pub name: String,
///     #[rdao(json)]
///     pub tags: Vec<String>,
///     #[rdao(flatten)]
///     pub base: Base,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(rdao))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::derive_from_row_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Attribute for service traits consumed by `rdao-codegen`.
///
/// Removes `#[rdao(...)]` helper attributes such as
/// `#[rdao(results(code, data))]`, which name a method's results.
///
/// ```ignore
/// #[rdao::service]
/// pub trait Usersvc {
///     #[rdao(results(code, data))]
///     async fn sign_up(&self, ctx: &Context, username: String) -> Result<(i32, String)>;
/// }
/// ```
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemTrait);
    service::service_impl(attr.into(), item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
