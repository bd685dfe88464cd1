//! Runtime used by generated HTTP service clients.
//!
//! A generated `XClient` owns a [`ClientCore`] and turns each interface
//! method into one HTTP round trip: pick a server, encode parameters, send
//! under the caller's [`Context`], then either stream a download to disk or
//! decode the JSON result object.

mod error;
mod file;
mod provider;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::context::Context;

pub use error::{ClientError, Result};
pub use file::FileHeader;
pub use provider::{EnvProvider, ServiceProvider, StaticProvider};
pub use reqwest;
pub use reqwest::multipart;

/// Settings shared by every call of a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

/// Overrides accepted by generated client constructors.
#[derive(Debug, Clone)]
pub enum ClientOption {
    Provider(Arc<dyn ServiceProvider>),
    Transport(reqwest::Client),
    OutputDir(PathBuf),
}

impl ClientOption {
    pub fn provider(provider: impl ServiceProvider + 'static) -> Self {
        ClientOption::Provider(Arc::new(provider))
    }
}

/// Server selection, transport and configuration behind a generated client.
#[derive(Debug, Clone)]
pub struct ClientCore {
    provider: Arc<dyn ServiceProvider>,
    transport: reqwest::Client,
    config: ClientConfig,
}

impl ClientCore {
    /// Defaults: an [`EnvProvider`] reading `default_env`, a fresh
    /// `reqwest::Client` and [`ClientConfig::default`]. Options apply in
    /// order, so later ones win.
    pub fn new(default_env: &str, options: impl IntoIterator<Item = ClientOption>) -> Self {
        let mut core = Self {
            provider: Arc::new(EnvProvider::new(default_env)),
            transport: reqwest::Client::new(),
            config: ClientConfig::default(),
        };
        for option in options {
            core.apply(option);
        }
        core
    }

    pub fn apply(&mut self, option: ClientOption) {
        match option {
            ClientOption::Provider(provider) => self.provider = provider,
            ClientOption::Transport(transport) => self.transport = transport,
            ClientOption::OutputDir(dir) => self.config.output_dir = dir,
        }
    }

    pub fn transport(&self) -> &reqwest::Client {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Select a server and resolve `path` against it.
    pub fn url(&self, path: &str) -> Result<Url> {
        let server = self.provider.select_server()?;
        let url = Url::parse(&format!("{}{}", server.trim_end_matches('/'), path))?;
        Ok(url)
    }

    /// Send under `ctx` and reject non-2xx responses.
    pub async fn send(&self, ctx: &Context, request: RequestBuilder) -> Result<Response> {
        let response = ctx.run(request.send()).await??;
        debug!(status = %response.status(), url = %response.url(), "service call");
        ensure_success(response).await
    }
}

/// Turn a non-2xx response into [`ClientError::Status`] carrying the body.
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Append `key=value` pairs to the query string; repeated keys stay repeated.
pub fn append_query(url: &mut Url, pairs: &[(&str, String)]) {
    if pairs.is_empty() {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
}

/// `application/x-www-form-urlencoded` body for the pairs.
pub fn form_body(pairs: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// The JSON object a service answers with, one field per declared result.
#[derive(Debug, Clone, Default)]
pub struct JsonResult {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl JsonResult {
    pub async fn from_response(response: Response) -> Result<Self> {
        let body = response.bytes().await?;
        Self::from_slice(&body)
    }

    pub fn from_slice(body: &[u8]) -> Result<Self> {
        match serde_json::from_slice(body) {
            Ok(serde_json::Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(ClientError::Decode(format!(
                "expected a JSON object, got {}",
                other
            ))),
            Err(e) => Err(ClientError::Decode(e.to_string())),
        }
    }

    /// Fail with [`ClientError::Remote`] when the error field is a
    /// non-empty string.
    pub fn check_error(&self, key: &str) -> Result<()> {
        match self.fields.get(key) {
            Some(serde_json::Value::String(msg)) if !msg.is_empty() => {
                Err(ClientError::Remote(msg.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Decode one result field. A missing field decodes as `null`, so
    /// optional results come back as `None`.
    pub fn field<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self.fields.remove(key).unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value)
            .map_err(|e| ClientError::Decode(format!("field `{}`: {}", key, e)))
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Only the final path component is kept so a response cannot write
/// outside the output directory.
pub fn disposition_filename(header: &str) -> Option<String> {
    let name = header.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|v| v.trim_matches('"').to_string())
    })?;
    let name = Path::new(&name).file_name()?.to_string_lossy().into_owned();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Stream the response body into `output_dir`, named by its
/// `Content-Disposition` header, and return the file opened for reading.
pub async fn save_download(mut response: Response, output_dir: &Path) -> Result<std::fs::File> {
    let filename = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_filename)
        .ok_or_else(|| {
            ClientError::Decode("response has no Content-Disposition filename".into())
        })?;
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(filename);
    let mut out = tokio::fs::File::create(&path).await?;
    while let Some(chunk) = response.chunk().await? {
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    debug!(path = %path.display(), "download saved");
    Ok(std::fs::File::open(&path)?)
}
