//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Error, Field, Fields, Ident, Result};

/// How a field is read from the row
enum Source {
    /// `row.get::<T>(column)`
    Column(String),
    /// JSON column decoded with serde
    Json(String),
    /// Embedded struct reading the same row
    Flatten,
    /// `Default::default()`
    Skip,
}

struct FieldConfig {
    ident: Ident,
    ty: syn::Type,
    source: Source,
}

/// Detects `#[serde(flatten)]` without parsing the rest of the serde attribute.
fn has_serde_flatten(attr: &syn::Attribute) -> bool {
    if !attr.path().is_ident("serde") {
        return false;
    }
    let mut found = false;
    // serde attributes may carry arguments we don't understand; ignore parse errors
    let _ = attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("flatten") {
            found = true;
        } else if meta.input.peek(syn::Token![=]) {
            let _: syn::Expr = meta.value()?.parse()?;
        } else if meta.input.peek(syn::token::Paren) {
            let _content;
            syn::parenthesized!(_content in meta.input);
        }
        Ok(())
    });
    found
}

fn parse_field_config(field: &Field) -> Result<FieldConfig> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new(field.span(), "tuple structs are not supported"))?;

    let mut column_name = ident.to_string();
    let mut skip = false;
    let mut json = false;
    let mut flatten = false;
    let mut serde_flatten = false;

    for attr in &field.attrs {
        if has_serde_flatten(attr) {
            serde_flatten = true;
        }
        if !attr.path().is_ident("rdao") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                column_name = lit.value();
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("json") {
                json = true;
            } else if meta.path.is_ident("flatten") {
                flatten = true;
            } else if meta.path.is_ident("pk") {
                // consumed by rdao-codegen
            } else if meta.path.is_ident("column_type") {
                let _: syn::LitStr = meta.value()?.parse()?;
            } else {
                return Err(meta.error(format!(
                    "unknown rdao attribute `{}`",
                    meta.path
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default()
                )));
            }
            Ok(())
        })?;
    }

    if flatten && json {
        return Err(Error::new(
            field.span(),
            "`flatten` and `json` cannot be combined",
        ));
    }

    // a json column keeps its serde(flatten) for serialization only
    let source = if skip {
        Source::Skip
    } else if flatten || (serde_flatten && !json) {
        Source::Flatten
    } else if json {
        Source::Json(column_name)
    } else {
        Source::Column(column_name)
    };

    Ok(FieldConfig {
        ident,
        ty: field.ty.clone(),
        source,
    })
}

/// Validates struct-level `#[rdao(table)]` / `#[rdao(table = "..")]`.
fn check_struct_attrs(input: &DeriveInput) -> Result<()> {
    for attr in &input.attrs {
        if !attr.path().is_ident("rdao") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                if meta.input.peek(syn::Token![=]) {
                    let _: syn::LitStr = meta.value()?.parse()?;
                }
                Ok(())
            } else {
                Err(meta.error("expected `table` or `table = \"name\"`"))
            }
        })?;
    }
    Ok(())
}

pub fn derive_from_row_impl(input: DeriveInput) -> Result<TokenStream> {
    check_struct_attrs(&input)?;

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(Error::new(input.span(), "only named fields are supported")),
        },
        _ => return Err(Error::new(input.span(), "only structs are supported")),
    };

    let field_configs: Vec<FieldConfig> = fields
        .iter()
        .map(parse_field_config)
        .collect::<Result<Vec<_>>>()?;

    let field_extractions = field_configs.iter().map(|config| {
        let field_ident = &config.ident;
        let ty = &config.ty;
        match &config.source {
            Source::Skip => quote! {
                #field_ident: <#ty as ::std::default::Default>::default()
            },
            Source::Flatten => quote! {
                #field_ident: <#ty as ::rdao::FromRow>::from_row(row)?
            },
            Source::Json(column) => quote! {
                #field_ident: ::rdao::RowExt::get_json::<#ty>(row, #column)?
            },
            Source::Column(column) => quote! {
                #field_ident: ::rdao::RowExt::get::<#ty>(row, #column)?
            },
        }
    });

    Ok(quote! {
        impl #impl_generics ::rdao::FromRow for #name #ty_generics #where_clause {
            fn from_row<R: ::rdao::Row + ?Sized>(row: &R) -> ::rdao::Result<Self> {
                Ok(Self {
                    #(#field_extractions),*
                })
            }
        }
    })
}
