//! Main code generator orchestrator

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::CodegenConfig;
use crate::error::{CodegenError, Result};
use crate::parser::InterfaceMeta;
use crate::schema::Table;

use super::client_generator::render_client;
use super::dao_generator::render_daos;
use super::ddl_generator::render_ddl;
use super::renderer::Renderer;

/// A rendered file waiting to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
}

impl Artifact {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }
}

/// Main code generator that renders DAOs, the client and the DDL script
pub struct CodeGenerator<'a> {
    config: &'a CodegenConfig,
    renderer: Renderer,
}

impl<'a> CodeGenerator<'a> {
    /// Create a new code generator with the given configuration
    pub fn new(config: &'a CodegenConfig) -> Result<Self> {
        Ok(Self {
            config,
            renderer: Renderer::new()?,
        })
    }

    /// Render every enabled artifact. Nothing touches the disk here.
    pub fn render(&self, tables: &[Table], interfaces: &[InterfaceMeta]) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        if self.config.generate_dao {
            artifacts.extend(self.render_daos(tables)?);
        }
        if self.config.generate_client {
            artifacts.extend(self.render_client(interfaces)?);
        }
        if self.config.generate_ddl {
            artifacts.push(self.render_ddl(tables)?);
        }
        Ok(artifacts)
    }

    pub fn render_daos(&self, tables: &[Table]) -> Result<Vec<Artifact>> {
        render_daos(&self.renderer, tables, self.config)
    }

    pub fn render_client(&self, interfaces: &[InterfaceMeta]) -> Result<Option<Artifact>> {
        render_client(&self.renderer, interfaces, self.config)
    }

    pub fn render_ddl(&self, tables: &[Table]) -> Result<Artifact> {
        render_ddl(&self.renderer, tables, self.config)
    }

    /// Render everything, then write. A rendering failure leaves the disk untouched.
    pub fn generate(
        &self,
        tables: &[Table],
        interfaces: &[InterfaceMeta],
    ) -> Result<Vec<Artifact>> {
        let artifacts = self.render(tables, interfaces)?;
        if self.config.dry_run {
            for artifact in &artifacts {
                info!(
                    "[dry run] would write {} ({} bytes)",
                    artifact.path.display(),
                    artifact.content.len()
                );
            }
            return Ok(artifacts);
        }
        for artifact in &artifacts {
            write_artifact(artifact)?;
        }
        Ok(artifacts)
    }
}

/// Write through a temporary sibling and rename it into place.
pub fn write_artifact(artifact: &Artifact) -> Result<()> {
    let path = &artifact.path;
    let wrap = |source: std::io::Error| CodegenError::WriteError {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    if path.exists() {
        warn!("Overwriting {}", path.display());
    }
    let tmp = temp_sibling(path);
    fs::write(&tmp, &artifact.content).map_err(wrap)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(wrap(err));
    }
    info!("Wrote {}", path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".rdao-tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact_creates_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dao/mod.rs");
        write_artifact(&Artifact::new(path.clone(), "first".into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_artifact(&Artifact::new(path.clone(), "second".into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn test_write_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let path = blocker.join("child.rs");
        let err = write_artifact(&Artifact::new(path.clone(), String::new())).unwrap_err();
        assert!(matches!(err, CodegenError::WriteError { path: ref p, .. } if *p == path));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodegenConfig {
            output_dao_dir: dir.path().join("dao"),
            generate_client: false,
            dry_run: true,
            ..CodegenConfig::default()
        };
        let generator = CodeGenerator::new(&config).unwrap();
        let artifacts = generator.generate(&[], &[]).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(!dir.path().join("dao").exists());
    }
}
