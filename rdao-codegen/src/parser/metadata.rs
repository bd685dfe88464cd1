//! Metadata structures extracted from entity and service declarations

use serde::{Deserialize, Serialize};

/// Scalar categories, free of width and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Date,
    Datetime,
    Time,
    Decimal,
    Json,
}

/// What a declared type means to the generators.
///
/// Serialized as `{"kind": "...", "of": ...}` so templates can branch on
/// `kind` without string matching on the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum SemanticType {
    Primitive(PrimitiveKind),
    Collection(Box<SemanticType>),
    Optional(Box<SemanticType>),
    Composite(String),
    FileRef,
    Context,
    BinaryStream,
    Unit,
}

impl SemanticType {
    /// Primitives and collections or optionals of primitives. Bytes travel
    /// as a body, so they are not builtin.
    pub fn is_builtin(&self) -> bool {
        match self {
            SemanticType::Primitive(kind) => *kind != PrimitiveKind::Bytes,
            SemanticType::Collection(inner) | SemanticType::Optional(inner) => inner.is_builtin(),
            _ => false,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, SemanticType::Optional(_))
    }

    /// The type under any `Option` wrappers.
    pub fn unwrap_optional(&self) -> &SemanticType {
        match self {
            SemanticType::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.unwrap_optional(), SemanticType::Collection(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.unwrap_optional(),
            SemanticType::Primitive(PrimitiveKind::Int | PrimitiveKind::Uint)
        )
    }

    /// Values that cannot be bound as a scalar column and go through JSON.
    pub fn needs_json(&self) -> bool {
        match self.unwrap_optional() {
            SemanticType::Primitive(PrimitiveKind::Json) => true,
            SemanticType::Composite(_) | SemanticType::Collection(_) => true,
            _ => false,
        }
    }
}

/// Which attribute asked for a field to be flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Embedding {
    /// `#[rdao(flatten)]`: the type must be a declared entity
    Declared,
    /// `#[serde(flatten)]`: hoisted only when the type is a declared
    /// entity, otherwise the field stays a single column
    Serde,
}

/// Metadata for one struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field identifier as declared
    pub name: String,

    /// Declared type as source text
    pub ty: String,

    pub semantic: SemanticType,

    /// Column name (`#[rdao(rename = "..")]`, else the field name)
    pub column: String,

    /// JSON name (`#[serde(rename = "..")]`, else the field name)
    pub json_name: String,

    /// Marked `#[rdao(pk)]`
    pub pk: bool,

    /// Explicit `#[rdao(column_type = "..")]`
    pub column_type: Option<String>,

    /// Marked `#[rdao(skip)]`
    pub skip: bool,

    /// Stored as a JSON document (`#[rdao(json)]`)
    pub json: bool,

    /// Set when the field is a candidate for hoisting into its container
    pub embedded: Option<Embedding>,

    pub doc: Option<String>,

    /// Path from the owning entity to this field, e.g. `base.id`
    pub accessor: String,

    /// `file:line` of the declaration
    pub location: String,
}

/// Metadata for a named-field struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,

    /// Storage name (`#[rdao(table = "..")]`, else snake_case of the name)
    pub table_name: String,

    /// Carries the `#[rdao(table)]` marker
    pub is_table: bool,

    pub doc: Option<String>,
    pub location: String,
}

/// How a parameter travels over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Context,
    Primitive,
    PrimitiveCollection,
    CompositeBody,
    FileUpload,
    FileUploadCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,

    /// Key on the wire (`#[rdao(rename = "..")]`, else the parameter name)
    pub wire_name: String,

    pub ty: String,
    pub semantic: SemanticType,
    pub kind: ParamKind,
}

/// How a result is produced from the HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    ErrorSignal,
    FileDownload,
    PlainValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    pub name: String,
    pub ty: String,
    pub semantic: SemanticType,
    pub kind: ResultKind,
}

/// Metadata for one service method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamDescriptor>,

    /// Plain and download results in declaration order, then the error
    /// signal if the method returns `Result`
    pub results: Vec<ResultDescriptor>,

    pub doc: Option<String>,
    pub location: String,
}

impl MethodDescriptor {
    pub fn error_result(&self) -> Option<&ResultDescriptor> {
        self.results
            .iter()
            .find(|r| r.kind == ResultKind::ErrorSignal)
    }

    /// Results other than the error signal
    pub fn value_results(&self) -> impl Iterator<Item = &ResultDescriptor> {
        self.results
            .iter()
            .filter(|r| r.kind != ResultKind::ErrorSignal)
    }

    pub fn has_download(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.kind == ResultKind::FileDownload)
    }

    pub fn params_of(&self, kind: ParamKind) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter().filter(move |p| p.kind == kind)
    }
}

/// Metadata for a service trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMeta {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
    pub doc: Option<String>,
    pub location: String,
}
