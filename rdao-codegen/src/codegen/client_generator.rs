//! Client generator - renders one HTTP client for a service interface

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CodegenConfig;
use crate::error::{CodegenError, Result};
use crate::parser::{
    InterfaceMeta, MethodDescriptor, ParamDescriptor, ParamKind, ResultKind, SemanticType,
};

use super::code_generator::Artifact;
use super::naming::http_method;
use super::renderer::{Renderer, CLIENT_TEMPLATE};

/// Type generated clients use for uploads, whatever the declaration says
const FILE_TYPE: &str = "FileHeader";

/// Type a downloaded result is handed back as
const DOWNLOAD_TYPE: &str = "std::fs::File";

#[derive(Debug, Serialize)]
struct ClientParam<'a> {
    name: &'a str,
    wire_name: &'a str,
    ty: String,
    semantic: &'a SemanticType,
    kind: ParamKind,
    /// `scalar`, `optional`, `collection` or `optional_collection`
    encode: &'static str,
}

#[derive(Debug, Serialize)]
struct ClientResult<'a> {
    name: &'a str,
    ty: String,
    download: bool,
}

#[derive(Debug, Serialize)]
struct ClientMethod<'a> {
    name: &'a str,
    doc_lines: Vec<&'a str>,
    params: Vec<ClientParam<'a>>,
    /// Expression passed to `ClientCore::send`
    ctx: String,
    body: Option<&'a str>,
    files: Vec<ClientParam<'a>>,
    results: Vec<ClientResult<'a>>,
    error_key: Option<&'a str>,
    return_ty: String,
    download: bool,
    has_pairs: bool,
    query_in_url: bool,
}

#[derive(Serialize)]
struct ClientContext<'a> {
    interface: &'a InterfaceMeta,
    doc_lines: Vec<&'a str>,
    methods: Vec<ClientMethod<'a>>,
    runtime: &'a str,
    vo_module: &'a str,
    service_env: Option<&'a str>,
    route_pattern_strategy: i32,
}

/// Render `client.rs` for the first interface; further interfaces are ignored.
pub fn render_client(
    renderer: &Renderer,
    interfaces: &[InterfaceMeta],
    config: &CodegenConfig,
) -> Result<Option<Artifact>> {
    let Some(interface) = interfaces.first() else {
        warn!("No service interface found in {:?}", config.svc_file);
        return Ok(None);
    };
    for skipped in &interfaces[1..] {
        warn!(
            "{}: only the first interface ({}) gets a client, skipping {}",
            skipped.location, interface.name, skipped.name
        );
    }
    debug!(
        "Rendering client for {} ({} methods)",
        interface.name,
        interface.methods.len()
    );
    let content = render_interface(renderer, interface, config)?;
    Ok(Some(Artifact::new(
        config.output_client_dir.join("client.rs"),
        content,
    )))
}

/// Render the client of one interface
pub fn render_interface(
    renderer: &Renderer,
    interface: &InterfaceMeta,
    config: &CodegenConfig,
) -> Result<String> {
    let methods = interface
        .methods
        .iter()
        .map(|m| client_method(interface, m))
        .collect::<Result<Vec<_>>>()?;
    let ctx = ClientContext {
        interface,
        doc_lines: doc_lines(interface.doc.as_deref()),
        methods,
        runtime: &config.runtime_crate,
        vo_module: &config.vo_module,
        service_env: config.service_env.as_deref(),
        route_pattern_strategy: config.route_pattern_strategy,
    };
    renderer.render_rust(CLIENT_TEMPLATE, ctx)
}

fn doc_lines(doc: Option<&str>) -> Vec<&str> {
    doc.map(|d| d.lines().map(str::trim).collect())
        .unwrap_or_default()
}

fn client_method<'a>(
    interface: &InterfaceMeta,
    method: &'a MethodDescriptor,
) -> Result<ClientMethod<'a>> {
    let invalid = |msg: &str| {
        CodegenError::ValidationError(format!(
            "{}: {}.{}: {}",
            method.location, interface.name, method.name, msg
        ))
    };

    let params = method
        .params
        .iter()
        .map(|p| client_param(p).map_err(|msg| invalid(&msg)))
        .collect::<Result<Vec<_>>>()?;

    let bodies: Vec<&ParamDescriptor> = method.params_of(ParamKind::CompositeBody).collect();
    if bodies.len() > 1 {
        return Err(invalid("more than one body parameter"));
    }
    let files: Vec<ClientParam<'a>> = method
        .params
        .iter()
        .filter(|p| matches!(p.kind, ParamKind::FileUpload | ParamKind::FileUploadCollection))
        .map(|p| client_param(p).map_err(|msg| invalid(&msg)))
        .collect::<Result<Vec<_>>>()?;
    if !files.is_empty() && !bodies.is_empty() {
        return Err(invalid("a body parameter cannot be combined with file uploads"));
    }
    let is_get = http_method(&method.name) == "GET";
    if !files.is_empty() && is_get {
        return Err(invalid("file uploads need a method that is not routed as GET"));
    }

    let results: Vec<ClientResult<'a>> = method
        .value_results()
        .map(|r| {
            let download = r.kind == ResultKind::FileDownload;
            ClientResult {
                name: &r.name,
                ty: if download {
                    DOWNLOAD_TYPE.to_string()
                } else {
                    r.ty.clone()
                },
                download,
            }
        })
        .collect();
    if results.iter().filter(|r| r.download).count() > 1 {
        return Err(invalid("at most one result can be a file download"));
    }

    let return_ty = match results.as_slice() {
        [] => "()".to_string(),
        [single] => single.ty.clone(),
        many => format!(
            "({})",
            many.iter().map(|r| r.ty.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };

    let ctx = match method.params_of(ParamKind::Context).next() {
        Some(p) if p.ty.starts_with('&') => p.name.clone(),
        Some(p) => format!("&{}", p.name),
        None => "&Context::background()".to_string(),
    };

    Ok(ClientMethod {
        name: &method.name,
        doc_lines: doc_lines(method.doc.as_deref()),
        has_pairs: params.iter().any(|p| p.semantic.is_builtin()),
        query_in_url: is_get || !bodies.is_empty(),
        params,
        ctx,
        body: bodies.first().map(|p| p.name.as_str()),
        files,
        download: results.iter().any(|r| r.download),
        results,
        error_key: method.error_result().map(|r| r.name.as_str()),
        return_ty,
    })
}

fn client_param(param: &ParamDescriptor) -> std::result::Result<ClientParam<'_>, String> {
    let ty = match param.kind {
        ParamKind::FileUpload => FILE_TYPE.to_string(),
        ParamKind::FileUploadCollection => format!("Vec<{}>", FILE_TYPE),
        _ => param.ty.clone(),
    };
    let encode = match &param.semantic {
        SemanticType::Optional(inner) => match inner.as_ref() {
            SemanticType::Collection(item) if item.is_optional() => {
                return Err(format!("`{}`: optional items cannot be sent", param.name));
            }
            SemanticType::Collection(_) => "optional_collection",
            _ => "optional",
        },
        SemanticType::Collection(item) if item.is_optional() => {
            return Err(format!("`{}`: optional items cannot be sent", param.name));
        }
        SemanticType::Collection(_) => "collection",
        _ => "scalar",
    };
    Ok(ClientParam {
        name: &param.name,
        wire_name: &param.wire_name,
        ty,
        semantic: &param.semantic,
        kind: param.kind,
        encode,
    })
}
