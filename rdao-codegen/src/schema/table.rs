//! Normalized storage view of a flattened entity

use heck::ToSnakeCase;
use serde::Serialize;
use syn::Type;

use crate::codegen::{escape_field_name, escape_ident};
use crate::error::{CodegenError, Result};
use crate::parser::{Embedding, EntityDescriptor, FieldDescriptor, PrimitiveKind, SemanticType};

/// One stored column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name in the store
    pub name: String,

    /// Path from the entity to the field, keyword-escaped (`base.r#type`)
    pub accessor: String,

    /// Declared Rust type
    pub ty: String,

    /// Type used when the column is passed as a key argument
    pub param_ty: String,

    pub semantic: SemanticType,
    pub sql_type: String,
    pub nullable: bool,
    pub pk: bool,
    pub auto_increment: bool,

    /// Bound and read through JSON
    pub json: bool,

    /// The field type implements `IsZero`; other fields are always written
    pub zero_check: bool,

    pub doc: Option<String>,
}

/// A table derived from a `#[rdao(table)]` entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Storage name
    pub name: String,

    pub struct_name: String,

    /// Module (and file stem) of the generated DAO
    pub module: String,

    /// `module` escaped for use in a `mod` declaration
    pub module_ident: String,

    pub columns: Vec<Column>,
    pub primary_key: Column,
    pub doc: Option<String>,
}

impl Table {
    /// Build the storage view of an already flattened entity.
    pub fn from_entity(entity: &EntityDescriptor) -> Result<Self> {
        let invalid =
            |msg: String| CodegenError::ValidationError(format!("{}: {}", entity.name, msg));

        let mut columns = Vec::with_capacity(entity.fields.len());
        for field in entity.fields.iter().filter(|f| !f.skip) {
            if field.embedded == Some(Embedding::Declared) {
                return Err(invalid(format!(
                    "field `{}` is still embedded; flatten before building tables",
                    field.name
                )));
            }
            let column = column_of(field)
                .map_err(|msg| invalid(format!("field `{}`: {}", field.name, msg)))?;
            columns.push(column);
        }

        let explicit: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.pk)
            .map(|(i, _)| i)
            .collect();
        let pk_index = match explicit.as_slice() {
            [single] => *single,
            [] => entity
                .fields
                .iter()
                .filter(|f| !f.skip)
                .position(|f| f.name == "id")
                .ok_or_else(|| {
                    invalid("no primary key: mark a field #[rdao(pk)] or name it `id`".into())
                })?,
            _ => return Err(invalid("composite primary keys are not supported".into())),
        };

        if columns.len() < 2 {
            return Err(invalid(
                "a table needs at least one column besides the primary key".into(),
            ));
        }

        let pk = &mut columns[pk_index];
        pk.pk = true;
        pk.auto_increment = pk.semantic.is_integer();
        if pk.json {
            return Err(invalid(format!("primary key `{}` cannot be a JSON column", pk.name)));
        }
        let primary_key = pk.clone();

        let module = entity.table_name.to_snake_case();
        Ok(Self {
            name: entity.table_name.clone(),
            struct_name: entity.name.clone(),
            module_ident: escape_field_name(&module),
            module,
            columns,
            primary_key,
            doc: entity.doc.clone(),
        })
    }

    /// Columns written by `insert`: everything but an auto-increment key
    pub fn insert_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.auto_increment)
    }

    /// Columns written by `update`: everything but the key
    pub fn update_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.pk)
    }
}

fn column_of(field: &FieldDescriptor) -> std::result::Result<Column, String> {
    let semantic = field.semantic.clone();
    match semantic.unwrap_optional() {
        SemanticType::FileRef
        | SemanticType::Context
        | SemanticType::BinaryStream
        | SemanticType::Unit => {
            return Err(format!("type `{}` cannot be stored", field.ty));
        }
        SemanticType::Composite(_) | SemanticType::Collection(_) if !field.json => {
            return Err(format!(
                "type `{}` needs #[rdao(json)] to be stored as a JSON column",
                field.ty
            ));
        }
        _ => {}
    }

    if semantic.is_integer()
        && matches!(scalar_ident(&field.ty).as_deref(), Some("i128" | "u128"))
    {
        return Err(format!(
            "type `{}` has no store value; use i64, u64 or Decimal",
            field.ty
        ));
    }

    let json = field.json || semantic.needs_json();
    let sql_type = match &field.column_type {
        Some(explicit) => explicit.clone(),
        None if json => "JSON".to_string(),
        None => sql_type_of(&field.ty, &semantic)?,
    };
    // Bare composites have no zero value; Option, collections and scalars do
    let zero_check = !matches!(semantic, SemanticType::Composite(_));
    let accessor = field
        .accessor
        .split('.')
        .map(escape_ident)
        .collect::<Vec<_>>()
        .join(".");

    Ok(Column {
        name: field.column.clone(),
        accessor,
        param_ty: param_type_of(&field.ty),
        ty: field.ty.clone(),
        nullable: semantic.is_optional(),
        semantic,
        sql_type,
        pk: field.pk,
        auto_increment: false,
        json,
        zero_check,
        doc: field.doc.clone(),
    })
}

/// Last path segment after peeling `Option`, smart pointers and references.
fn scalar_ident(ty: &str) -> Option<String> {
    let mut ty: Type = syn::parse_str(ty).ok()?;
    loop {
        ty = match ty {
            Type::Reference(r) => *r.elem,
            Type::Paren(p) => *p.elem,
            Type::Path(path) => {
                let last = path.path.segments.last()?;
                let name = last.ident.to_string();
                match (&last.arguments, name.as_str()) {
                    (
                        syn::PathArguments::AngleBracketed(args),
                        "Option" | "Box" | "Arc" | "Rc",
                    ) => match args.args.first()? {
                        syn::GenericArgument::Type(inner) => inner.clone(),
                        _ => return None,
                    },
                    _ => return Some(name),
                }
            }
            _ => return None,
        };
    }
}

fn sql_type_of(ty: &str, semantic: &SemanticType) -> std::result::Result<String, String> {
    let ident = scalar_ident(ty).unwrap_or_default();
    let sql = match semantic.unwrap_optional() {
        SemanticType::Primitive(PrimitiveKind::Int) => match ident.as_str() {
            "i8" => "TINYINT",
            "i16" => "SMALLINT",
            "i32" => "INT",
            _ => "BIGINT",
        },
        SemanticType::Primitive(PrimitiveKind::Uint) => match ident.as_str() {
            "u8" => "TINYINT UNSIGNED",
            "u16" => "SMALLINT UNSIGNED",
            "u32" => "INT UNSIGNED",
            _ => "BIGINT UNSIGNED",
        },
        SemanticType::Primitive(PrimitiveKind::Float) if ident == "f32" => "FLOAT",
        SemanticType::Primitive(PrimitiveKind::Float) => "DOUBLE",
        SemanticType::Primitive(PrimitiveKind::Bool) => "TINYINT(1)",
        SemanticType::Primitive(PrimitiveKind::String) => "VARCHAR(255)",
        SemanticType::Primitive(PrimitiveKind::Bytes) => "BLOB",
        SemanticType::Primitive(PrimitiveKind::Date) => "DATE",
        SemanticType::Primitive(PrimitiveKind::Datetime) => "DATETIME",
        SemanticType::Primitive(PrimitiveKind::Time) => "TIME",
        SemanticType::Primitive(PrimitiveKind::Decimal) => "DECIMAL(20,6)",
        SemanticType::Primitive(PrimitiveKind::Json)
        | SemanticType::Composite(_)
        | SemanticType::Collection(_) => "JSON",
        _ => return Err(format!("no column type for `{}`", ty)),
    };
    Ok(sql.to_string())
}

/// Borrowed form for key arguments: `String` → `&str`, `Vec<u8>` → `&[u8]`
fn param_type_of(ty: &str) -> String {
    match ty {
        "String" => "&str".to_string(),
        "Vec<u8>" => "&[u8]".to_string(),
        "Option<String>" => "Option<&str>".to_string(),
        "Option<Vec<u8>>" => "Option<&[u8]>".to_string(),
        other => other.to_string(),
    }
}
