//! Resolve declared Rust types into [`SemanticType`]s

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type, TypePath};

use super::metadata::{PrimitiveKind, SemanticType};

/// Containers the generators know without a declaration in scope.
pub const BUILTIN_COMPOSITES: &[&str] = &["HashMap", "BTreeMap"];

/// Source text of a type, without the spaces `quote` puts between tokens.
pub fn type_to_string(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c == ' ' {
            let prev = if i > 0 { chars[i - 1] } else { ' ' };
            let next = chars.get(i + 1).copied().unwrap_or(' ');
            let keep = (prev.is_alphanumeric() || prev == '_' || prev == '\'')
                && (next.is_alphanumeric() || next == '_' || next == '&');
            if keep || prev == ',' {
                out.push(' ');
            }
            continue;
        }
        out.push(*c);
    }
    out
}

fn generic_args(path: &TypePath) -> Vec<&Type> {
    path.path
        .segments
        .last()
        .map(|seg| match &seg.arguments {
            PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(ty) => Some(ty),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.qself.is_none() && p.path.is_ident("u8"))
}

fn single_arg<'a>(name: &str, path: &'a TypePath) -> Result<&'a Type, String> {
    match generic_args(path).as_slice() {
        [inner] => Ok(inner),
        _ => Err(format!("`{}` expects exactly one type argument", name)),
    }
}

/// Resolve a declared type.
///
/// Composite names met on the way (including inside generic arguments) are
/// pushed onto `refs` so the caller can check them once every unit has
/// been visited.
pub fn resolve(ty: &Type, refs: &mut Vec<String>) -> Result<SemanticType, String> {
    match ty {
        Type::Path(path) => resolve_path(path, refs),
        Type::Reference(r) => match r.elem.as_ref() {
            Type::Slice(s) if is_u8(&s.elem) => Ok(SemanticType::Primitive(PrimitiveKind::Bytes)),
            Type::Path(p) if p.path.is_ident("str") => {
                Ok(SemanticType::Primitive(PrimitiveKind::String))
            }
            elem => resolve(elem, refs),
        },
        Type::Slice(s) if is_u8(&s.elem) => Ok(SemanticType::Primitive(PrimitiveKind::Bytes)),
        Type::Array(a) if is_u8(&a.elem) => Ok(SemanticType::Primitive(PrimitiveKind::Bytes)),
        Type::Slice(s) => Ok(SemanticType::Collection(Box::new(resolve(&s.elem, refs)?))),
        Type::Array(a) => Ok(SemanticType::Collection(Box::new(resolve(&a.elem, refs)?))),
        Type::Paren(p) => resolve(&p.elem, refs),
        Type::Group(g) => resolve(&g.elem, refs),
        Type::Tuple(t) if t.elems.is_empty() => Ok(SemanticType::Unit),
        Type::Tuple(_) => Err("tuple types are only supported as method results".into()),
        Type::ImplTrait(_) => Err("`impl Trait` types are not supported".into()),
        Type::TraitObject(_) => Err("trait objects are not supported".into()),
        other => Err(format!(
            "unsupported type `{}`",
            type_to_string(other)
        )),
    }
}

fn resolve_path(path: &TypePath, refs: &mut Vec<String>) -> Result<SemanticType, String> {
    if path.qself.is_some() {
        return Err("qualified self types are not supported".into());
    }
    let Some(last) = path.path.segments.last() else {
        return Err("empty type path".into());
    };
    let name = last.ident.to_string();
    let primitive = |kind| Ok(SemanticType::Primitive(kind));

    match name.as_str() {
        "bool" => primitive(PrimitiveKind::Bool),
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => primitive(PrimitiveKind::Int),
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => primitive(PrimitiveKind::Uint),
        "f32" | "f64" => primitive(PrimitiveKind::Float),
        "String" | "str" => primitive(PrimitiveKind::String),
        "NaiveDate" => primitive(PrimitiveKind::Date),
        "NaiveDateTime" | "DateTime" => primitive(PrimitiveKind::Datetime),
        "NaiveTime" => primitive(PrimitiveKind::Time),
        "Decimal" => primitive(PrimitiveKind::Decimal),
        "JsonValue" => primitive(PrimitiveKind::Json),
        "Value"
            if path
                .path
                .segments
                .iter()
                .any(|s| s.ident == "serde_json") =>
        {
            primitive(PrimitiveKind::Json)
        }
        "Vec" => {
            let inner = single_arg(&name, path)?;
            if is_u8(inner) {
                primitive(PrimitiveKind::Bytes)
            } else {
                Ok(SemanticType::Collection(Box::new(resolve(inner, refs)?)))
            }
        }
        "HashSet" | "BTreeSet" | "VecDeque" => {
            let inner = single_arg(&name, path)?;
            Ok(SemanticType::Collection(Box::new(resolve(inner, refs)?)))
        }
        "Option" => {
            let inner = single_arg(&name, path)?;
            Ok(SemanticType::Optional(Box::new(resolve(inner, refs)?)))
        }
        "Box" | "Arc" | "Rc" => resolve(single_arg(&name, path)?, refs),
        "Context" => Ok(SemanticType::Context),
        "FileHeader" | "FileModel" | "File" => Ok(SemanticType::FileRef),
        "Body" | "ByteStream" => Ok(SemanticType::BinaryStream),
        _ => {
            for arg in generic_args(path) {
                resolve(arg, refs)?;
            }
            if !BUILTIN_COMPOSITES.contains(&name.as_str()) {
                refs.push(name.clone());
            }
            Ok(SemanticType::Composite(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sem(src: &str) -> (SemanticType, Vec<String>) {
        let ty: Type = syn::parse_str(src).unwrap();
        let mut refs = Vec::new();
        let sem = resolve(&ty, &mut refs).unwrap();
        (sem, refs)
    }

    fn prim(kind: PrimitiveKind) -> SemanticType {
        SemanticType::Primitive(kind)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(sem("i64").0, prim(PrimitiveKind::Int));
        assert_eq!(sem("u32").0, prim(PrimitiveKind::Uint));
        assert_eq!(sem("&str").0, prim(PrimitiveKind::String));
        assert_eq!(sem("Vec<u8>").0, prim(PrimitiveKind::Bytes));
        assert_eq!(sem("chrono::NaiveDateTime").0, prim(PrimitiveKind::Datetime));
        assert_eq!(sem("DateTime<Utc>").0, prim(PrimitiveKind::Datetime));
        assert_eq!(sem("serde_json::Value").0, prim(PrimitiveKind::Json));
        assert_eq!(sem("rust_decimal::Decimal").0, prim(PrimitiveKind::Decimal));
    }

    #[test]
    fn test_wrappers() {
        assert_eq!(
            sem("Option<Vec<String>>").0,
            SemanticType::Optional(Box::new(SemanticType::Collection(Box::new(prim(
                PrimitiveKind::String
            )))))
        );
        assert_eq!(sem("Arc<i32>").0, prim(PrimitiveKind::Int));
        assert_eq!(
            sem("&[i32]").0,
            SemanticType::Collection(Box::new(prim(PrimitiveKind::Int)))
        );
    }

    #[test]
    fn test_special_types() {
        assert_eq!(sem("&rdao::Context").0, SemanticType::Context);
        assert_eq!(sem("FileHeader").0, SemanticType::FileRef);
        assert_eq!(sem("std::fs::File").0, SemanticType::FileRef);
        assert_eq!(
            sem("Vec<FileHeader>").0,
            SemanticType::Collection(Box::new(SemanticType::FileRef))
        );
        assert_eq!(sem("()").0, SemanticType::Unit);
    }

    #[test]
    fn test_composites_are_recorded() {
        let (ty, refs) = sem("Vec<PageRet<UserVo>>");
        assert_eq!(
            ty,
            SemanticType::Collection(Box::new(SemanticType::Composite("PageRet".into())))
        );
        assert_eq!(refs, vec!["UserVo".to_string(), "PageRet".to_string()]);

        let (_, refs) = sem("HashMap<String, i64>");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_unsupported() {
        let mut refs = Vec::new();
        let ty: Type = syn::parse_str("impl Iterator<Item = u8>").unwrap();
        assert!(resolve(&ty, &mut refs).is_err());
        let ty: Type = syn::parse_str("(i32, String)").unwrap();
        assert!(resolve(&ty, &mut refs).is_err());
    }

    #[test]
    fn test_type_to_string() {
        let ty: Type = syn::parse_str("Option < Vec < String > >").unwrap();
        assert_eq!(type_to_string(&ty), "Option<Vec<String>>");
        let ty: Type = syn::parse_str("HashMap<String, i64>").unwrap();
        assert_eq!(type_to_string(&ty), "HashMap<String, i64>");
        let ty: Type = syn::parse_str("&'a str").unwrap();
        assert_eq!(type_to_string(&ty), "&'a str");
        let ty: Type = syn::parse_str("&mut Vec<u8>").unwrap();
        assert_eq!(type_to_string(&ty), "&mut Vec<u8>");
    }
}
