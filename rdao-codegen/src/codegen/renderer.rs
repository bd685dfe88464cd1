//! Template environment shared by the generators

use heck::{ToLowerCamelCase, ToSnakeCase};
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;

use super::naming::{http_method, no_split_pattern, route_pattern, to_struct_name};
use crate::codegen::escape_ident;
use crate::error::{CodegenError, Result};

/// First line of every generated Rust file
pub const GENERATED_HEADER: &str = "// Code generated by rdao-codegen. DO NOT EDIT.\n";

pub const DAO_TEMPLATE: &str = "dao.rs";
pub const DAO_MOD_TEMPLATE: &str = "dao_mod.rs";
pub const CLIENT_TEMPLATE: &str = "client.rs";
pub const DDL_TEMPLATE: &str = "ddl.sql";

/// minijinja environment with the helper filters and the bundled templates.
///
/// Undefined variables are errors, so a template that reads a field the
/// context does not carry fails instead of rendering an empty string.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_filter("httpMethod", |name: &str| http_method(name).to_string());
        env.add_filter("pattern", |name: &str| route_pattern(name));
        env.add_filter("noSplitPattern", |name: &str| no_split_pattern(name));
        env.add_filter("isBuiltin", is_builtin_filter);
        env.add_filter("toCamel", |s: &str| to_struct_name(s));
        env.add_filter("toLowerCamel", |s: &str| s.to_lower_camel_case());
        env.add_filter("toSnake", |s: &str| s.to_snake_case());
        env.add_filter("toUpper", |s: &str| s.to_uppercase());
        env.add_filter("ident", |s: &str| escape_ident(s));
        env.add_filter("rustStr", |s: &str| format!("{:?}", s));

        for (name, source) in [
            (DAO_TEMPLATE, include_str!("../../templates/dao.rs.jinja")),
            (DAO_MOD_TEMPLATE, include_str!("../../templates/dao_mod.rs.jinja")),
            (CLIENT_TEMPLATE, include_str!("../../templates/client.rs.jinja")),
            (DDL_TEMPLATE, include_str!("../../templates/ddl.sql.jinja")),
        ] {
            env.add_template(name, source)
                .map_err(|e| CodegenError::render(name, format!("{:#}", e)))?;
        }

        Ok(Self { env })
    }

    /// Render a template as plain text.
    pub fn render<S: Serialize>(&self, template: &str, ctx: S) -> Result<String> {
        let tmpl = self
            .env
            .get_template(template)
            .map_err(|e| CodegenError::render(template, e))?;
        tmpl.render(ctx)
            .map_err(|e| CodegenError::render(template, format!("{:#}", e)))
    }

    /// Render a Rust template, check that it parses and pretty-print it.
    pub fn render_rust<S: Serialize>(&self, template: &str, ctx: S) -> Result<String> {
        let source = self.render(template, ctx)?;
        format_rust(template, &source)
    }
}

/// Parse generated source with `syn` and print it with `prettyplease`.
pub fn format_rust(template: &str, source: &str) -> Result<String> {
    let file = syn::parse_file(source).map_err(|e| {
        CodegenError::render(
            template,
            format!(
                "generated code does not parse at line {}: {}",
                e.span().start().line,
                e
            ),
        )
    })?;
    Ok(format!("{}\n{}", GENERATED_HEADER, prettyplease::unparse(&file)))
}

fn not_a_type(value: &Value) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!("isBuiltin expects a semantic type, got {}", value),
    )
}

/// Accepts a semantic type or anything carrying one in `semantic`.
fn is_builtin_filter(value: &Value) -> std::result::Result<bool, Error> {
    let semantic = value.get_attr("semantic")?;
    if !semantic.is_undefined() {
        return is_builtin_filter(&semantic);
    }
    let kind = value.get_attr("kind")?;
    match kind.as_str() {
        Some("primitive") => Ok(value.get_attr("of")?.as_str() != Some("bytes")),
        Some("collection" | "optional") => is_builtin_filter(&value.get_attr("of")?),
        Some("composite" | "file_ref" | "context" | "binary_stream" | "unit") => Ok(false),
        _ => Err(not_a_type(value)),
    }
}
