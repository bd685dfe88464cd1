//! Naming utilities for code generation

use heck::{ToPascalCase, ToSnakeCase};
use syn::ext::IdentExt;
use syn::parse::Parser;
use syn::Ident;

/// Convert a table name to a struct name (PascalCase)
pub fn to_struct_name(table_name: &str) -> String {
    table_name.to_pascal_case()
}

/// Split a method name into lowercase snake_case words
pub fn snake_words(name: &str) -> Vec<String> {
    name.to_snake_case()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// HTTP verb for a service method, chosen by its first word
///
/// `get|list|page|count` → GET, `create|insert` → POST, `update` → PUT,
/// `delete` → DELETE, anything else → POST.
pub fn http_method(name: &str) -> &'static str {
    let words = snake_words(name);
    match words.first().map(String::as_str) {
        Some("get" | "list" | "page" | "count") => "GET",
        Some("create" | "insert") => "POST",
        Some("update") => "PUT",
        Some("delete") => "DELETE",
        _ => "POST",
    }
}

/// Route words: snake_case words without a leading HTTP verb
fn route_words(name: &str) -> Vec<String> {
    let mut words = snake_words(name);
    if matches!(
        words.first().map(String::as_str),
        Some("get" | "post" | "put" | "delete")
    ) {
        words.remove(0);
    }
    words
}

/// Route path of a method, e.g. `get_user_info` → `user/info`
pub fn route_pattern(name: &str) -> String {
    route_words(name).join("/")
}

/// Route segment without separators, e.g. `get_user_info` → `userinfo`
pub fn no_split_pattern(name: &str) -> String {
    route_words(name).concat().to_lowercase()
}

/// Keywords a raw identifier cannot stand in for
const NOT_RAW: &[&str] = &["_", "crate", "self", "Self", "super"];

/// Whether `name` is an identifier only as a raw identifier, i.e. a strict
/// or reserved Rust keyword.
pub fn is_rust_keyword(name: &str) -> bool {
    Ident::parse_any.parse_str(name).is_ok() && syn::parse_str::<Ident>(name).is_err()
}

/// Add the raw prefix to an identifier that is a Rust keyword
pub fn escape_ident(name: &str) -> String {
    let bare = name.trim_start_matches("r#");
    if is_rust_keyword(bare) && !NOT_RAW.contains(&bare) {
        format!("r#{}", bare)
    } else {
        bare.to_string()
    }
}

/// Escape a field name if it's a Rust keyword
pub fn escape_field_name(name: &str) -> String {
    escape_ident(&name.to_snake_case())
}
