//! DAO generator - renders one `<table>.rs` per table plus the `mod.rs` listing them

use serde::Serialize;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::schema::{Column, Table};

use super::code_generator::Artifact;
use super::renderer::{Renderer, DAO_MOD_TEMPLATE, DAO_TEMPLATE};

/// Full-width statements baked into a DAO as string constants
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Statements {
    insert: String,
    upsert: String,
    update: String,
    update_many: String,
    delete: String,
    get: String,
    select: String,
    count: String,
    pk_where: String,
}

#[derive(Serialize)]
struct DaoContext<'a> {
    table: &'a Table,
    dao: String,
    runtime: &'a str,
    entity_path: String,
    doc_lines: Vec<&'a str>,
    insert_columns: Vec<&'a Column>,
    update_columns: Vec<&'a Column>,
    sql: Statements,
}

/// Render the DAO files for all tables, `mod.rs` first.
pub fn render_daos(
    renderer: &Renderer,
    tables: &[Table],
    config: &CodegenConfig,
) -> Result<Vec<Artifact>> {
    let output_dir = &config.output_dao_dir;
    let mut artifacts = Vec::with_capacity(tables.len() + 1);

    let mod_content = renderer.render_rust(
        DAO_MOD_TEMPLATE,
        minijinja::context! { tables => tables },
    )?;
    artifacts.push(Artifact::new(output_dir.join("mod.rs"), mod_content));

    for table in tables {
        let file_name = format!("{}.rs", table.module);
        debug!("Rendering DAO for {} -> {}", table.struct_name, file_name);
        let content = render_dao(renderer, table, config)?;
        artifacts.push(Artifact::new(output_dir.join(file_name), content));
    }
    Ok(artifacts)
}

/// Render the DAO of a single table
pub fn render_dao(renderer: &Renderer, table: &Table, config: &CodegenConfig) -> Result<String> {
    let ctx = DaoContext {
        table,
        dao: format!("{}Dao", table.struct_name),
        runtime: &config.runtime_crate,
        entity_path: format!("{}::{}", config.domain_module, table.struct_name),
        doc_lines: table
            .doc
            .as_deref()
            .map(|d| d.lines().map(str::trim).collect())
            .unwrap_or_default(),
        insert_columns: table.insert_columns().collect(),
        update_columns: table.update_columns().collect(),
        sql: build_statements(table),
    };
    renderer.render_rust(DAO_TEMPLATE, ctx)
}

fn quoted(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build the SELECT columns list
fn build_select_columns(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a `SET` or `WHERE` list of `col = ?` terms
fn build_assignments<'a>(columns: impl Iterator<Item = &'a Column>, sep: &str) -> String {
    columns
        .map(|c| format!("{} = ?", quoted(&c.name)))
        .collect::<Vec<_>>()
        .join(sep)
}

fn build_insert(table: &Table, columns: &[&Column]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quoted(&c.name)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(&table.name),
        names.join(", "),
        placeholders
    )
}

fn build_statements(table: &Table) -> Statements {
    let name = quoted(&table.name);
    let select_columns = build_select_columns(table);
    let insert_columns: Vec<&Column> = table.insert_columns().collect();
    let all_columns: Vec<&Column> = table.columns.iter().collect();
    let set_clause = build_assignments(table.update_columns(), ", ");
    let pk_where = format!("WHERE {} = ?", quoted(&table.primary_key.name));

    let on_duplicate = table
        .update_columns()
        .map(|c| format!("{0} = VALUES({0})", quoted(&c.name)))
        .collect::<Vec<_>>()
        .join(", ");

    Statements {
        insert: build_insert(table, &insert_columns),
        upsert: format!(
            "{} ON DUPLICATE KEY UPDATE {}",
            build_insert(table, &all_columns),
            on_duplicate
        ),
        update: format!("UPDATE {} SET {} {}", name, set_clause, pk_where),
        update_many: format!("UPDATE {} SET {}", name, set_clause),
        delete: format!("DELETE FROM {}", name),
        get: format!("SELECT {} FROM {} {}", select_columns, name, pk_where),
        select: format!("SELECT {} FROM {}", select_columns, name),
        count: format!("SELECT COUNT(1) FROM {}", name),
        pk_where,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{EntityDescriptor, FieldDescriptor, PrimitiveKind, SemanticType};

    fn field(name: &str, ty: &str, semantic: SemanticType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            ty: ty.to_string(),
            semantic,
            column: name.to_string(),
            json_name: name.to_string(),
            pk: false,
            column_type: None,
            skip: false,
            json: false,
            embedded: None,
            doc: None,
            accessor: name.to_string(),
            location: "user.rs:1".to_string(),
        }
    }

    fn make_table() -> Table {
        let mut tags = field(
            "tags",
            "Vec<String>",
            SemanticType::Collection(Box::new(SemanticType::Primitive(PrimitiveKind::String))),
        );
        tags.json = true;
        let mut create_at = field(
            "create_at",
            "NaiveDateTime",
            SemanticType::Primitive(PrimitiveKind::Datetime),
        );
        create_at.accessor = "base.create_at".to_string();
        let entity = EntityDescriptor {
            name: "User".to_string(),
            fields: vec![
                field("id", "i64", SemanticType::Primitive(PrimitiveKind::Int)),
                field("name", "String", SemanticType::Primitive(PrimitiveKind::String)),
                tags,
                create_at,
            ],
            table_name: "user".to_string(),
            is_table: true,
            doc: Some("Registered accounts".to_string()),
            location: "user.rs:1".to_string(),
        };
        Table::from_entity(&entity).unwrap()
    }

    fn render(table: &Table) -> String {
        let renderer = Renderer::new().unwrap();
        render_dao(&renderer, table, &CodegenConfig::default()).unwrap()
    }

    #[test]
    fn test_build_select_columns() {
        let table = make_table();
        assert_eq!(
            build_select_columns(&table),
            "`id`, `name`, `tags`, `create_at`"
        );
    }

    #[test]
    fn test_build_statements() {
        let sql = build_statements(&make_table());
        assert_eq!(
            sql.insert,
            "INSERT INTO `user` (`name`, `tags`, `create_at`) VALUES (?, ?, ?)"
        );
        assert_eq!(
            sql.upsert,
            "INSERT INTO `user` (`id`, `name`, `tags`, `create_at`) VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `tags` = VALUES(`tags`), \
             `create_at` = VALUES(`create_at`)"
        );
        assert_eq!(
            sql.update,
            "UPDATE `user` SET `name` = ?, `tags` = ?, `create_at` = ? WHERE `id` = ?"
        );
        assert_eq!(sql.delete, "DELETE FROM `user`");
        assert_eq!(sql.count, "SELECT COUNT(1) FROM `user`");
        assert_eq!(
            sql.get,
            "SELECT `id`, `name`, `tags`, `create_at` FROM `user` WHERE `id` = ?"
        );
    }

    #[test]
    fn test_render_dao_shape() {
        let code = render(&make_table());

        assert!(code.starts_with("// Code generated by rdao-codegen. DO NOT EDIT."));
        assert!(code.contains("use crate::domain::User;"));
        assert!(code.contains("pub struct UserDao<Q: Querier>"));
        assert!(code.contains("impl HasPrimaryKey for User"));
        assert!(code.contains("self.id = key;"));
        for method in [
            "insert",
            "upsert",
            "upsert_none_zero",
            "update",
            "update_none_zero",
            "update_many",
            "update_many_none_zero",
            "delete_many",
            "get",
            "select_many",
            "count_many",
            "page_many",
        ] {
            assert!(
                code.contains(&format!("pub async fn {}(", method)),
                "missing {}",
                method
            );
        }
        assert!(code.contains("/// Registered accounts"));
    }

    #[test]
    fn test_render_dao_binds() {
        let code = render(&make_table());

        // JSON columns go through to_json, flattened fields keep their path
        assert!(code.contains("rdao::to_json(&entity.tags)"));
        assert!(!code.contains("bind(&entity.tags)"));
        assert!(code.contains(".bind(&entity.base.create_at)"));
        assert!(code.contains("IsZero::is_zero(&entity.name)"));
        assert!(code.contains(".context(\"UserDao::page_many\")"));
        assert!(code.contains("key: i64"));
    }

    #[test]
    fn test_render_dao_string_key_is_not_back_populated() {
        let entity = EntityDescriptor {
            name: "Tag".to_string(),
            fields: vec![
                FieldDescriptor {
                    pk: true,
                    ..field("code", "String", SemanticType::Primitive(PrimitiveKind::String))
                },
                field("label", "String", SemanticType::Primitive(PrimitiveKind::String)),
            ],
            table_name: "tag".to_string(),
            is_table: true,
            doc: None,
            location: "tag.rs:1".to_string(),
        };
        let code = render(&Table::from_entity(&entity).unwrap());
        assert!(code.contains("fn set_primary_key(&mut self, _key: u64) {}"));
        assert!(code.contains("key: &str"));
        assert!(!code.contains("`code` = VALUES(`code`)"));
    }

    #[test]
    fn test_render_daos_lists_modules() {
        let renderer = Renderer::new().unwrap();
        let config = CodegenConfig::default();
        let artifacts = render_daos(&renderer, &[make_table()], &config).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].path.ends_with("dao/mod.rs"));
        assert!(artifacts[0].content.contains("pub mod user;"));
        assert!(artifacts[1].path.ends_with("dao/user.rs"));
    }
}
