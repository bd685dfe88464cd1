//! Configuration settings for rdao-codegen

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use crate::error::{CodegenError, Result};

/// What to do when flattening yields two fields with the same column name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Keep the field met first in depth-first order and log a warning
    #[default]
    FirstWins,
    /// Abort generation
    Error,
}

/// Everything the generator needs to know about one run.
///
/// Missing keys fall back to [`CodegenConfig::default`], so a file only
/// has to name what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Directory of entity declarations (`*.rs`)
    pub domain_dir: PathBuf,
    /// File declaring the service trait
    pub svc_file: PathBuf,
    /// Directory of value objects referenced by the service trait
    pub vo_dir: Option<PathBuf>,

    /// Comma-separated table names, `*` keeps every table
    pub include_tables: String,
    /// Comma-separated table names dropped after inclusion
    pub exclude_tables: String,

    pub generate_dao: bool,
    pub generate_client: bool,
    pub generate_ddl: bool,

    pub output_dao_dir: PathBuf,
    pub output_client_dir: PathBuf,
    pub output_ddl_file: PathBuf,

    /// Module path generated DAOs import entities from
    pub domain_module: String,
    /// Module path the generated client imports value objects from
    pub vo_module: String,
    /// Crate path of the rdao runtime in generated code
    pub runtime_crate: String,

    /// `1` routes as `/<interface>/<methodname>`, anything else as `/<method/name>`
    pub route_pattern_strategy: i32,
    /// Environment variable the default client provider reads the server
    /// address from; the upper-cased interface name when unset
    pub service_env: Option<String>,

    pub collision_policy: CollisionPolicy,
    /// Type names resolvable without a declaration in the visited units
    pub known_types: Vec<String>,

    /// Render and report artifacts without touching the filesystem
    pub dry_run: bool,
    /// Filter directive for the CLI logger, `RUST_LOG` wins over it
    pub log_level: Option<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            domain_dir: PathBuf::new(),
            svc_file: PathBuf::new(),
            vo_dir: None,
            include_tables: defaults::INCLUDE_TABLES.into(),
            exclude_tables: defaults::EXCLUDE_TABLES.into(),
            generate_dao: defaults::GENERATE_DAO,
            generate_client: defaults::GENERATE_CLIENT,
            generate_ddl: defaults::GENERATE_DDL,
            output_dao_dir: defaults::OUTPUT_DAO_DIR.into(),
            output_client_dir: defaults::OUTPUT_CLIENT_DIR.into(),
            output_ddl_file: defaults::OUTPUT_DDL_FILE.into(),
            domain_module: defaults::DOMAIN_MODULE.into(),
            vo_module: defaults::VO_MODULE.into(),
            runtime_crate: defaults::RUNTIME_CRATE.into(),
            route_pattern_strategy: defaults::ROUTE_PATTERN_STRATEGY,
            service_env: None,
            collision_policy: CollisionPolicy::default(),
            known_types: Vec::new(),
            dry_run: defaults::DRY_RUN,
            log_level: None,
        }
    }
}

fn invalid(msg: impl Into<String>) -> CodegenError {
    CodegenError::ValidationError(msg.into())
}

impl CodegenConfig {
    /// Layer `rdao-codegen.toml` (or `config_path`) under `RDAO_CODEGEN_*`
    /// environment variables. Nested keys use `__` as the separator.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path),
            None => File::with_name("rdao-codegen").required(false),
        };
        let env = Environment::with_prefix("RDAO_CODEGEN")
            .prefix_separator("_")
            .separator("__");

        Ok(Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?)
    }

    /// Whether any enabled artifact needs the entity declarations
    pub fn needs_domain(&self) -> bool {
        self.generate_dao || self.generate_ddl
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.generate_dao || self.generate_client || self.generate_ddl) {
            return Err(invalid(
                "nothing to generate: enable generate_dao, generate_client or generate_ddl",
            ));
        }

        if self.needs_domain() {
            if self.domain_dir.as_os_str().is_empty() {
                return Err(invalid("domain_dir is required when generating DAOs or DDL"));
            }
            if !self.domain_dir.is_dir() {
                return Err(invalid(format!(
                    "domain directory not found: {}",
                    self.domain_dir.display()
                )));
            }
            if self.generate_dao && self.domain_module.trim().is_empty() {
                return Err(invalid("domain_module is required when generate_dao is true"));
            }
        }

        if self.generate_client {
            if self.svc_file.as_os_str().is_empty() {
                return Err(invalid("svc_file is required when generate_client is true"));
            }
            if !self.svc_file.is_file() {
                return Err(invalid(format!(
                    "service file not found: {}",
                    self.svc_file.display()
                )));
            }
            if self.vo_module.trim().is_empty() {
                return Err(invalid("vo_module is required when generate_client is true"));
            }
        }

        match &self.vo_dir {
            Some(dir) if !dir.is_dir() => Err(invalid(format!(
                "value-object directory not found: {}",
                dir.display()
            ))),
            _ if self.runtime_crate.trim().is_empty() => {
                Err(invalid("runtime_crate must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodegenConfig::default();
        assert_eq!(config.include_tables, defaults::INCLUDE_TABLES);
        assert!(config.generate_dao);
        assert!(config.generate_client);
        assert!(!config.generate_ddl);
        assert_eq!(config.collision_policy, CollisionPolicy::FirstWins);
        assert_eq!(config.runtime_crate, "rdao");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_validation_missing_domain() {
        let config = CodegenConfig {
            generate_client: false,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("domain_dir"));
    }

    #[test]
    fn test_validation_nothing_enabled() {
        let config = CodegenConfig {
            generate_dao: false,
            generate_client: false,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nothing to generate"));
    }

    #[test]
    fn test_validation_ok() {
        let dir = tempfile::tempdir().unwrap();
        let svc = dir.path().join("svc.rs");
        std::fs::write(&svc, "pub trait Svc {}").unwrap();
        let config = CodegenConfig {
            domain_dir: dir.path().to_path_buf(),
            svc_file: svc,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            domain_dir = "domain"
            svc_file = "svc.rs"
            route_pattern_strategy = 1
            collision_policy = "error"
            known_types = ["Uuid"]
            log_level = "debug"
        "#;
        let config: CodegenConfig = toml::from_str(toml_content).unwrap();
        assert!(config.generate_dao);
        assert_eq!(config.route_pattern_strategy, 1);
        assert_eq!(config.collision_policy, CollisionPolicy::Error);
        assert_eq!(config.known_types, vec!["Uuid"]);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.domain_module, "crate::domain");
    }
}
