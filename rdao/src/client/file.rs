//! Files sent as multipart uploads

use std::path::{Path, PathBuf};

use reqwest::multipart::Part;
use reqwest::Body;
use tokio_util::io::ReaderStream;

use super::error::Result;

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file to upload: either a path streamed at send time or in-memory content.
#[derive(Debug, Clone)]
pub struct FileHeader {
    filename: String,
    source: Source,
}

impl FileHeader {
    /// Upload the file at `path` under its own file name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            filename,
            source: Source::Path(path.to_path_buf()),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            source: Source::Bytes(content.into()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Load the file content.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            Source::Path(path) => tokio::fs::read(path).await,
            Source::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// Build the multipart part. A path is opened and sized here, so a
    /// missing file fails before anything is sent; its content is streamed
    /// with the request body.
    pub async fn to_part(&self) -> Result<Part> {
        let part = match &self.source {
            Source::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let length = file.metadata().await?.len();
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            }
            Source::Bytes(bytes) => Part::bytes(bytes.clone()),
        };
        Ok(part.file_name(self.filename.clone()))
    }
}
