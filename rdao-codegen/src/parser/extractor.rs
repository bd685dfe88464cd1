//! Metadata extraction from Rust declaration units

use std::collections::HashSet;
use std::path::Path;

use heck::ToSnakeCase;
use syn::spanned::Spanned;
use syn::visit::Visit;
use syn::{
    Attribute, Expr, Fields, FnArg, Generics, ItemEnum, ItemStruct, ItemTrait, ItemType,
    ItemUnion, Lit, LitStr, Meta, Pat, ReturnType, TraitItem, TraitItemFn, Type,
};
use tracing::debug;

use super::metadata::{
    Embedding, EntityDescriptor, FieldDescriptor, InterfaceMeta, MethodDescriptor, ParamDescriptor,
    ParamKind, PrimitiveKind, ResultDescriptor, ResultKind, SemanticType,
};
use super::semantic::{resolve, type_to_string};
use crate::error::{CodegenError, Result};

/// Everything collected from the visited units, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entities: Vec<EntityDescriptor>,
    pub interfaces: Vec<InterfaceMeta>,
}

impl Extraction {
    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// A composite type name that must be declared somewhere.
#[derive(Debug, Clone)]
struct PendingRef {
    ty: String,
    owner: String,
    location: String,
}

/// Shared collector for one or more declaration units.
///
/// ```ignore
/// let mut extractor = Extractor::new(&config.known_types);
/// extractor.extract_file(Path::new("src/domain/user.rs"))?;
/// extractor.extract_file(Path::new("src/domain/base.rs"))?;
/// let extraction = extractor.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct Extractor {
    known_types: HashSet<String>,
    declared: HashSet<String>,
    entities: Vec<EntityDescriptor>,
    interfaces: Vec<InterfaceMeta>,
    pending: Vec<PendingRef>,
}

impl Extractor {
    pub fn new<S: AsRef<str>>(known_types: &[S]) -> Self {
        Self {
            known_types: known_types.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    /// Read and visit one file.
    pub fn extract_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)?;
        self.extract_source(&path.display().to_string(), &source)
    }

    /// Visit an in-memory unit; `label` names it in locations.
    pub fn extract_source(&mut self, label: &str, source: &str) -> Result<()> {
        let file = syn::parse_file(source).map_err(|e| CodegenError::ParseError {
            path: label.to_string(),
            message: format!("line {}: {}", e.span().start().line, e),
        })?;
        let mut visitor = UnitVisitor {
            label,
            extractor: self,
            error: None,
        };
        visitor.visit_file(&file);
        match visitor.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolve deferred type names and hand out the collected metadata.
    pub fn finish(self) -> Result<Extraction> {
        for pending in &self.pending {
            if !self.declared.contains(&pending.ty) && !self.known_types.contains(&pending.ty) {
                return Err(CodegenError::ExtractionError {
                    name: pending.owner.clone(),
                    location: pending.location.clone(),
                    message: format!("unresolved type `{}`", pending.ty),
                });
            }
        }
        debug!(
            "Extracted {} entities, {} interfaces",
            self.entities.len(),
            self.interfaces.len()
        );
        Ok(Extraction {
            entities: self.entities,
            interfaces: self.interfaces,
        })
    }

    /// Resolve `ty` and queue the composite names it mentions, except the
    /// type parameters in `scope`, which the declaration itself introduces.
    fn resolve_tracked(
        &mut self,
        ty: &Type,
        scope: &HashSet<String>,
        owner: &str,
        location: &str,
    ) -> Result<SemanticType> {
        let mut refs = Vec::new();
        let semantic =
            resolve(ty, &mut refs).map_err(|message| extraction(owner, location, message))?;
        self.pending.extend(
            refs.into_iter()
                .filter(|ty| !scope.contains(ty))
                .map(|ty| PendingRef {
                    ty,
                    owner: owner.to_string(),
                    location: location.to_string(),
                }),
        );
        Ok(semantic)
    }

    fn entity(&mut self, label: &str, item: &ItemStruct) -> Result<()> {
        let name = item.ident.to_string();
        self.declared.insert(name.clone());
        let Fields::Named(named) = &item.fields else {
            return Ok(());
        };
        let location = location_of(label, item.span());
        let (is_table, explicit_table) =
            table_attr(&item.attrs).map_err(|e| extraction(&name, &location, e))?;
        let scope = type_params(&item.generics);

        let mut fields = Vec::with_capacity(named.named.len());
        for field in &named.named {
            let Some(ident) = &field.ident else { continue };
            let field_name = unraw(&ident.to_string());
            let owner = format!("{}.{}", name, field_name);
            let field_location = location_of(label, field.span());
            let attrs = field_attrs(&field.attrs)
                .map_err(|e| extraction(&owner, &field_location, e))?;

            // Skipped fields never reach storage, so their type is not checked.
            let semantic = if attrs.skip {
                resolve(&field.ty, &mut Vec::new())
                    .unwrap_or_else(|_| SemanticType::Composite(type_to_string(&field.ty)))
            } else {
                self.resolve_tracked(&field.ty, &scope, &owner, &field_location)?
            };
            let embedded = if attrs.flatten {
                Some(Embedding::Declared)
            } else if attrs.serde_flatten && !attrs.json {
                Some(Embedding::Serde)
            } else {
                None
            };

            fields.push(FieldDescriptor {
                column: attrs.rename.unwrap_or_else(|| field_name.clone()),
                json_name: attrs.json_name.unwrap_or_else(|| field_name.clone()),
                name: field_name.clone(),
                ty: type_to_string(&field.ty),
                semantic,
                pk: attrs.pk,
                column_type: attrs.column_type,
                skip: attrs.skip,
                json: attrs.json,
                embedded,
                doc: doc_of(&field.attrs),
                accessor: ident.to_string(),
                location: field_location,
            });
        }

        debug!("Extracted entity {} ({} fields)", name, fields.len());
        self.entities.push(EntityDescriptor {
            table_name: explicit_table.unwrap_or_else(|| name.to_snake_case()),
            name,
            fields,
            is_table,
            doc: doc_of(&item.attrs),
            location,
        });
        Ok(())
    }

    fn interface(&mut self, label: &str, item: &ItemTrait) -> Result<()> {
        let name = item.ident.to_string();
        let scope = type_params(&item.generics);
        let mut methods = Vec::new();
        for trait_item in &item.items {
            if let TraitItem::Fn(method) = trait_item {
                methods.push(self.method(label, &name, &scope, method)?);
            }
        }
        debug!("Extracted interface {} ({} methods)", name, methods.len());
        self.interfaces.push(InterfaceMeta {
            name,
            methods,
            doc: doc_of(&item.attrs),
            location: location_of(label, item.span()),
        });
        Ok(())
    }

    fn method(
        &mut self,
        label: &str,
        interface: &str,
        scope: &HashSet<String>,
        method: &TraitItemFn,
    ) -> Result<MethodDescriptor> {
        let sig = &method.sig;
        let name = unraw(&sig.ident.to_string());
        let owner = format!("{}::{}", interface, name);
        let location = location_of(label, sig.span());

        if !sig.generics.params.is_empty() {
            return Err(extraction(&owner, &location, "generic methods are not supported"));
        }
        let result_names =
            results_attr(&method.attrs).map_err(|e| extraction(&owner, &location, e))?;

        let mut params = Vec::new();
        for input in &sig.inputs {
            let FnArg::Typed(typed) = input else { continue };
            let param_location = location_of(label, typed.span());
            let Pat::Ident(pat) = typed.pat.as_ref() else {
                return Err(extraction(
                    &owner,
                    &param_location,
                    "parameters must be plain identifiers",
                ));
            };
            let param_name = unraw(&pat.ident.to_string());
            let attrs = field_attrs(&typed.attrs)
                .map_err(|e| extraction(&owner, &param_location, e))?;
            let semantic = self.resolve_tracked(&typed.ty, scope, &owner, &param_location)?;
            let kind = classify_param(&semantic).map_err(|e| {
                extraction(&owner, &param_location, format!("parameter `{}`: {}", param_name, e))
            })?;
            params.push(ParamDescriptor {
                wire_name: attrs.rename.unwrap_or_else(|| param_name.clone()),
                name: param_name,
                ty: type_to_string(&typed.ty),
                semantic,
                kind,
            });
        }

        let (ok_ty, err_ty) = match &sig.output {
            ReturnType::Default => (None, None),
            ReturnType::Type(_, ty) => {
                match split_result(ty).map_err(|e| extraction(&owner, &location, e))? {
                    Some((ok, err)) => (Some(ok), Some(err)),
                    None => (Some(ty.as_ref()), None),
                }
            }
        };

        let value_types: Vec<&Type> = match ok_ty {
            None => Vec::new(),
            Some(Type::Tuple(tuple)) => tuple.elems.iter().collect(),
            Some(ty) => vec![ty],
        };
        let names = match result_names {
            Some(names) if names.len() != value_types.len() => {
                return Err(extraction(
                    &owner,
                    &location,
                    format!(
                        "{} result names given for {} results",
                        names.len(),
                        value_types.len()
                    ),
                ));
            }
            Some(names) => names,
            None if value_types.len() == 1 => vec!["data".to_string()],
            None => (0..value_types.len()).map(|i| format!("ret{}", i)).collect(),
        };

        let mut results = Vec::with_capacity(value_types.len() + 1);
        for (ty, result_name) in value_types.into_iter().zip(names) {
            let semantic = self.resolve_tracked(ty, scope, &owner, &location)?;
            let kind = match semantic {
                SemanticType::FileRef | SemanticType::BinaryStream => ResultKind::FileDownload,
                SemanticType::Unit | SemanticType::Context => {
                    return Err(extraction(
                        &owner,
                        &location,
                        format!("result `{}` cannot be returned", result_name),
                    ));
                }
                _ => ResultKind::PlainValue,
            };
            results.push(ResultDescriptor {
                name: result_name,
                ty: type_to_string(ty),
                semantic,
                kind,
            });
        }
        if let Some(err_ty) = err_ty {
            results.push(ResultDescriptor {
                name: "err".to_string(),
                ty: err_ty.map(type_to_string).unwrap_or_default(),
                semantic: SemanticType::Primitive(PrimitiveKind::String),
                kind: ResultKind::ErrorSignal,
            });
        }

        Ok(MethodDescriptor {
            name,
            params,
            results,
            doc: doc_of(&method.attrs),
            location,
        })
    }
}

struct UnitVisitor<'a> {
    label: &'a str,
    extractor: &'a mut Extractor,
    error: Option<CodegenError>,
}

impl UnitVisitor<'_> {
    fn record(&mut self, result: Result<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl<'ast> Visit<'ast> for UnitVisitor<'_> {
    fn visit_item_struct(&mut self, item: &'ast ItemStruct) {
        let result = self.extractor.entity(self.label, item);
        self.record(result);
    }

    fn visit_item_trait(&mut self, item: &'ast ItemTrait) {
        let result = self.extractor.interface(self.label, item);
        self.record(result);
    }

    fn visit_item_enum(&mut self, item: &'ast ItemEnum) {
        self.extractor.declared.insert(item.ident.to_string());
    }

    fn visit_item_type(&mut self, item: &'ast ItemType) {
        self.extractor.declared.insert(item.ident.to_string());
    }

    fn visit_item_union(&mut self, item: &'ast ItemUnion) {
        self.extractor.declared.insert(item.ident.to_string());
    }
}

fn extraction(name: &str, location: &str, message: impl Into<String>) -> CodegenError {
    CodegenError::ExtractionError {
        name: name.to_string(),
        location: location.to_string(),
        message: message.into(),
    }
}

fn location_of(label: &str, span: proc_macro2::Span) -> String {
    format!("{}:{}", label, span.start().line)
}

fn type_params(generics: &Generics) -> HashSet<String> {
    generics.type_params().map(|p| p.ident.to_string()).collect()
}

fn unraw(ident: &str) -> String {
    ident.trim_start_matches("r#").to_string()
}

/// Joined `///` lines, or `None` when there are none.
fn doc_of(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[derive(Debug, Default)]
struct FieldAttrs {
    rename: Option<String>,
    json_name: Option<String>,
    pk: bool,
    column_type: Option<String>,
    skip: bool,
    json: bool,
    flatten: bool,
    serde_flatten: bool,
}

fn field_attrs(attrs: &[Attribute]) -> std::result::Result<FieldAttrs, String> {
    let mut out = FieldAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("serde") {
            // Arguments we don't interpret are parsed and dropped
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("flatten") {
                    out.serde_flatten = true;
                } else if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.json_name = Some(lit.value());
                } else if meta.input.peek(syn::Token![=]) {
                    let _: Expr = meta.value()?.parse()?;
                } else if meta.input.peek(syn::token::Paren) {
                    let _content;
                    syn::parenthesized!(_content in meta.input);
                }
                Ok(())
            })
            .map_err(|e| format!("malformed #[serde] attribute: {}", e))?;
            continue;
        }
        if !attr.path().is_ident("rdao") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit.value());
            } else if meta.path.is_ident("column_type") {
                let lit: LitStr = meta.value()?.parse()?;
                out.column_type = Some(lit.value());
            } else if meta.path.is_ident("pk") {
                out.pk = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("json") {
                out.json = true;
            } else if meta.path.is_ident("flatten") {
                out.flatten = true;
            } else {
                return Err(meta.error("unknown rdao attribute"));
            }
            Ok(())
        })
        .map_err(|e| e.to_string())?;
    }
    if out.flatten && out.json {
        return Err("`flatten` and `json` cannot be combined".into());
    }
    Ok(out)
}

/// `#[rdao(table)]` or `#[rdao(table = "name")]`
fn table_attr(attrs: &[Attribute]) -> std::result::Result<(bool, Option<String>), String> {
    let mut is_table = false;
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("rdao")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                is_table = true;
                if meta.input.peek(syn::Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    name = Some(lit.value());
                }
                Ok(())
            } else {
                Err(meta.error("expected `table` or `table = \"name\"`"))
            }
        })
        .map_err(|e| e.to_string())?;
    }
    Ok((is_table, name))
}

/// `#[rdao(results(a, b))]` on a service method
fn results_attr(attrs: &[Attribute]) -> std::result::Result<Option<Vec<String>>, String> {
    let mut names = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("rdao")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("results") {
                let mut list = Vec::new();
                meta.parse_nested_meta(|inner| {
                    let ident = inner
                        .path
                        .get_ident()
                        .ok_or_else(|| inner.error("expected a result name"))?;
                    list.push(ident.to_string());
                    Ok(())
                })?;
                names = Some(list);
                Ok(())
            } else {
                Err(meta.error("expected `results(..)`"))
            }
        })
        .map_err(|e| e.to_string())?;
    }
    Ok(names)
}

/// Split `Result<T, E>` / `Result<T>` into its Ok type and optional error type.
fn split_result(ty: &Type) -> std::result::Result<Option<(&Type, Option<&Type>)>, String> {
    let Type::Path(path) = ty else {
        return Ok(None);
    };
    let Some(last) = path.path.segments.last() else {
        return Ok(None);
    };
    if last.ident != "Result" {
        return Ok(None);
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return Err("`Result` needs an Ok type".into());
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    let ok = types.next().ok_or("`Result` needs an Ok type")?;
    Ok(Some((ok, types.next())))
}

fn mentions_special(semantic: &SemanticType) -> bool {
    match semantic {
        SemanticType::FileRef | SemanticType::Context | SemanticType::BinaryStream => true,
        SemanticType::Collection(inner) | SemanticType::Optional(inner) => mentions_special(inner),
        _ => false,
    }
}

fn classify_param(semantic: &SemanticType) -> std::result::Result<ParamKind, String> {
    match semantic {
        SemanticType::Context => Ok(ParamKind::Context),
        SemanticType::FileRef => Ok(ParamKind::FileUpload),
        SemanticType::Collection(inner) if **inner == SemanticType::FileRef => {
            Ok(ParamKind::FileUploadCollection)
        }
        SemanticType::BinaryStream => Err("streams cannot be sent; use a FileHeader".into()),
        SemanticType::Unit => Err("unit parameters are not supported".into()),
        other if mentions_special(other) => {
            Err("files and contexts must be passed directly or as a Vec of files".into())
        }
        other if other.is_builtin() && other.is_collection() => Ok(ParamKind::PrimitiveCollection),
        other if other.is_builtin() => Ok(ParamKind::Primitive),
        _ => Ok(ParamKind::CompositeBody),
    }
}
