//! `#[service]` attribute: makes annotated service traits compile

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{Error, ItemTrait, Result, TraitItem};

/// Strips `#[rdao(...)]` from trait methods and their parameters.
///
/// The annotations are read by `rdao-codegen` from source; the compiler
/// would reject them as unknown attributes.
pub fn service_impl(attr: TokenStream, item: ItemTrait) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(Error::new_spanned(attr, "#[service] takes no arguments"));
    }
    let mut item = item;
    for trait_item in &mut item.items {
        if let TraitItem::Fn(method) = trait_item {
            method.attrs.retain(|a| !a.path().is_ident("rdao"));
            for input in &mut method.sig.inputs {
                if let syn::FnArg::Typed(pat) = input {
                    pat.attrs.retain(|a| !a.path().is_ident("rdao"));
                }
            }
        }
    }
    Ok(item.into_token_stream())
}
