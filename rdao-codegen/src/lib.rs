//! rdao-codegen: Generate DAOs, HTTP service clients and DDL from annotated Rust declarations
//!
//! The generator reads plain Rust source, never compiling it:
//!
//! - entity structs in a domain directory; those marked `#[rdao(table)]`
//!   become tables with a generated `<Entity>Dao`
//! - one service trait; its methods become an `<Interface>Client` speaking
//!   HTTP + JSON
//! - optionally, a `CREATE TABLE` script for the tables
//!
//! Generated code links against the `rdao` runtime crate.
//!
//! # From a build script
//!
//! Declare the inputs under the package metadata:
//!
//! ```toml
//! [package.metadata.rdao-codegen]
//! domain_dir = "src/domain"
//! svc_file = "src/svc.rs"
//! vo_dir = "src/vo"
//! ```
//!
//! and let `build.rs` pick them up:
//!
//! ```rust,ignore
//! fn main() {
//!     rdao_codegen::generate_from_cargo_metadata()
//!         .expect("rdao code generation failed");
//! }
//! ```
//!
//! The DAO directory has a `mod.rs` declaring one module per table, and
//! the client is a single file:
//!
//! ```rust,ignore
//! pub mod dao {
//!     include!(concat!(env!("OUT_DIR"), "/dao/mod.rs"));
//! }
//! pub mod client {
//!     include!(concat!(env!("OUT_DIR"), "/client/client.rs"));
//! }
//! ```
//!
//! # Builder
//!
//! ```rust,ignore
//! fn main() {
//!     rdao_codegen::CodegenBuilder::new("src/domain", "src/svc.rs")
//!         .output_dir(std::env::var("OUT_DIR").unwrap())
//!         .generate()
//!         .expect("rdao code generation failed");
//! }
//! ```
//!
//! # Command line
//!
//! ```bash
//! rdao-codegen --domain src/domain --svc src/svc.rs --output ./src/generated generate
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod parser;
pub mod schema;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

pub use codegen::{Artifact, CodeGenerator};
pub use config::{CodegenConfig, CollisionPolicy};
pub use error::{CodegenError, Result};

use parser::{EntityDescriptor, Extraction, Extractor, InterfaceMeta};
use schema::Table;

/// Everything extracted from the declarations, ready to render
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    /// Every declared struct as written, tables or not
    pub entities: Vec<EntityDescriptor>,

    /// Interfaces declared in the service file
    pub interfaces: Vec<InterfaceMeta>,

    /// Tables left after the include/exclude filters
    pub tables: Vec<Table>,
}

/// Main entry point for code generation
pub fn generate(config: &CodegenConfig) -> Result<Vec<Artifact>> {
    let model = load_model(config)?;
    let generator = CodeGenerator::new(config)?;
    let artifacts = generator.generate(&model.tables, &model.interfaces)?;
    info!("Code generation complete: {} files", artifacts.len());
    Ok(artifacts)
}

/// Read, extract, flatten and filter without rendering anything
pub fn load_model(config: &CodegenConfig) -> Result<Model> {
    config.validate()?;
    let extraction = extract(config)?;
    info!(
        "Found {} entities and {} interfaces",
        extraction.entities.len(),
        extraction.interfaces.len()
    );

    let tables = schema::flatten(&extraction.entities, config.collision_policy)?
        .iter()
        .map(Table::from_entity)
        .collect::<Result<Vec<_>>>()?;
    let tables = filter_tables(tables, &config.include_tables, &config.exclude_tables);
    debug!(
        "After filtering: {} tables (include={}, exclude={})",
        tables.len(),
        config.include_tables,
        config.exclude_tables
    );

    let svc_label = format!("{}:", config.svc_file.display());
    let interfaces = extraction
        .interfaces
        .into_iter()
        .filter(|i| i.location.starts_with(&svc_label))
        .collect();

    Ok(Model {
        entities: extraction.entities,
        interfaces,
        tables,
    })
}

/// Visit every unit the enabled generators need: domain files, then value
/// objects, then the service file.
fn extract(config: &CodegenConfig) -> Result<Extraction> {
    let mut extractor = Extractor::new(config.known_types.as_slice());
    if config.needs_domain() {
        for path in rust_files(&config.domain_dir)? {
            debug!("Reading {}", path.display());
            extractor.extract_file(&path)?;
        }
    }
    if config.generate_client {
        if let Some(vo_dir) = &config.vo_dir {
            for path in rust_files(vo_dir)? {
                debug!("Reading {}", path.display());
                extractor.extract_file(&path)?;
            }
        }
        extractor.extract_file(&config.svc_file)?;
    }
    extractor.finish()
}

/// `*.rs` files directly under `dir`, sorted by path
fn rust_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn table_names(list: &str) -> HashSet<&str> {
    list.split(',').map(str::trim).filter(|n| !n.is_empty()).collect()
}

/// Keep tables named by `include` (`*` or blank keeps all), then drop
/// those named by `exclude`.
fn filter_tables(tables: Vec<Table>, include: &str, exclude: &str) -> Vec<Table> {
    let include = match include.trim() {
        "" | "*" => None,
        list => Some(table_names(list)),
    };
    let exclude = table_names(exclude);

    tables
        .into_iter()
        .filter(|t| include.as_ref().map_or(true, |keep| keep.contains(t.name.as_str())))
        .filter(|t| !exclude.contains(t.name.as_str()))
        .collect()
}

/// Fluent configuration for build scripts and tests
pub struct CodegenBuilder {
    config: CodegenConfig,
}

impl CodegenBuilder {
    /// Create a new builder reading entities from `domain_dir` and the
    /// service interface from `svc_file`
    pub fn new(domain_dir: impl AsRef<Path>, svc_file: impl AsRef<Path>) -> Self {
        Self {
            config: CodegenConfig {
                domain_dir: domain_dir.as_ref().to_path_buf(),
                svc_file: svc_file.as_ref().to_path_buf(),
                ..CodegenConfig::default()
            },
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: CodegenConfig) -> Self {
        Self { config }
    }

    /// Directory of value-object declarations used by the service
    pub fn vo_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.vo_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Put DAOs under `<dir>/dao`, the client under `<dir>/client` and the
    /// DDL script at `<dir>/schema.sql`
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.config.output_dao_dir = dir.join("dao");
        self.config.output_client_dir = dir.join("client");
        self.config.output_ddl_file = dir.join("schema.sql");
        self
    }

    /// Set the output directory for DAOs only
    pub fn output_dao_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dao_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the output directory for the client only
    pub fn output_client_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_client_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set tables to include
    pub fn include_tables(mut self, tables: &[&str]) -> Self {
        self.config.include_tables = tables.join(",");
        self
    }

    /// Set tables to exclude
    pub fn exclude_tables(mut self, tables: &[&str]) -> Self {
        self.config.exclude_tables = tables.join(",");
        self
    }

    /// Generate only DAOs
    pub fn dao_only(mut self) -> Self {
        self.config.generate_client = false;
        self.config.generate_ddl = false;
        self
    }

    /// Generate only the client
    pub fn client_only(mut self) -> Self {
        self.config.generate_dao = false;
        self.config.generate_ddl = false;
        self
    }

    /// Also write the DDL script
    pub fn with_ddl(mut self) -> Self {
        self.config.generate_ddl = true;
        self
    }

    /// Module path the DAOs import entities from
    pub fn domain_module(mut self, path: &str) -> Self {
        self.config.domain_module = path.to_string();
        self
    }

    /// Module path the client imports value objects from
    pub fn vo_module(mut self, path: &str) -> Self {
        self.config.vo_module = path.to_string();
        self
    }

    /// Crate path generated code uses for the runtime
    pub fn runtime_crate(mut self, path: &str) -> Self {
        self.config.runtime_crate = path.to_string();
        self
    }

    pub fn route_pattern_strategy(mut self, strategy: i32) -> Self {
        self.config.route_pattern_strategy = strategy;
        self
    }

    /// Environment variable the client reads its servers from
    pub fn service_env(mut self, var: &str) -> Self {
        self.config.service_env = Some(var.to_string());
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    /// Type names declared outside the scanned files
    pub fn known_types(mut self, names: &[&str]) -> Self {
        self.config
            .known_types
            .extend(names.iter().map(|s| s.to_string()));
        self
    }

    /// Enable dry run mode (preview without writing files)
    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Generate the code
    pub fn generate(self) -> Result<Vec<Artifact>> {
        generate(&self.config)
    }
}

/// Configuration for `[package.metadata.rdao-codegen]` in Cargo.toml
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CargoMetadataConfig {
    /// Directory of entity declarations (required for DAOs and DDL)
    domain_dir: Option<String>,

    /// File declaring the service trait (required for the client)
    svc_file: Option<String>,

    vo_dir: Option<String>,

    #[serde(default)]
    include_tables: Vec<String>,

    #[serde(default)]
    exclude_tables: Vec<String>,

    generate_dao: Option<bool>,
    generate_client: Option<bool>,
    generate_ddl: Option<bool>,

    /// Output directories, relative to the manifest (default: under OUT_DIR)
    output_dao_dir: Option<String>,
    output_client_dir: Option<String>,
    output_ddl_file: Option<String>,

    domain_module: Option<String>,
    vo_module: Option<String>,
    runtime_crate: Option<String>,
    route_pattern_strategy: Option<i32>,
    service_env: Option<String>,
    collision_policy: Option<CollisionPolicy>,

    #[serde(default)]
    known_types: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    #[serde(rename = "rdao-codegen")]
    rdao_codegen: Option<CargoMetadataConfig>,
}

/// Generate code from `[package.metadata.rdao-codegen]` in Cargo.toml
///
/// Input paths resolve against the manifest directory; outputs default to
/// `OUT_DIR/dao`, `OUT_DIR/client` and `OUT_DIR/schema.sql`.
///
/// ```toml
/// [package.metadata.rdao-codegen]
/// domain_dir = "src/domain"
/// svc_file = "src/svc.rs"
/// exclude_tables = ["migrations"]
/// ```
pub fn generate_from_cargo_metadata() -> Result<Vec<Artifact>> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map_err(|_| {
        CodegenError::ConfigError(
            "CARGO_MANIFEST_DIR not set - are you running from build.rs?".into(),
        )
    })?;
    let manifest_dir = PathBuf::from(manifest_dir);

    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        CodegenError::ConfigError(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let metadata = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.rdao_codegen)
        .ok_or_else(|| {
            CodegenError::ConfigError(
                "Missing [package.metadata.rdao-codegen] section in Cargo.toml".into(),
            )
        })?;

    let out_dir = std::env::var("OUT_DIR").map(PathBuf::from).map_err(|_| {
        CodegenError::ConfigError("OUT_DIR not set - are you running from build.rs?".into())
    })?;

    let config = config_from_metadata(metadata, &manifest_dir, &out_dir);

    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());
    if config.needs_domain() {
        println!("cargo:rerun-if-changed={}", config.domain_dir.display());
    }
    if config.generate_client {
        println!("cargo:rerun-if-changed={}", config.svc_file.display());
        if let Some(vo_dir) = &config.vo_dir {
            println!("cargo:rerun-if-changed={}", vo_dir.display());
        }
    }

    generate(&config)
}

fn config_from_metadata(
    metadata: CargoMetadataConfig,
    manifest_dir: &Path,
    out_dir: &Path,
) -> CodegenConfig {
    let mut config = CodegenConfig::default();
    let resolve = |p: &str| manifest_dir.join(p);

    if let Some(dir) = metadata.domain_dir {
        config.domain_dir = resolve(&dir);
    }
    if let Some(file) = metadata.svc_file {
        config.svc_file = resolve(&file);
    } else {
        config.generate_client = false;
    }
    config.vo_dir = metadata.vo_dir.as_deref().map(resolve);

    config.output_dao_dir = metadata
        .output_dao_dir
        .as_deref()
        .map(resolve)
        .unwrap_or_else(|| out_dir.join("dao"));
    config.output_client_dir = metadata
        .output_client_dir
        .as_deref()
        .map(resolve)
        .unwrap_or_else(|| out_dir.join("client"));
    config.output_ddl_file = metadata
        .output_ddl_file
        .as_deref()
        .map(resolve)
        .unwrap_or_else(|| out_dir.join("schema.sql"));

    if !metadata.include_tables.is_empty() {
        config.include_tables = metadata.include_tables.join(",");
    }
    if !metadata.exclude_tables.is_empty() {
        config.exclude_tables = metadata.exclude_tables.join(",");
    }

    if let Some(flag) = metadata.generate_dao {
        config.generate_dao = flag;
    }
    if let Some(flag) = metadata.generate_client {
        config.generate_client = flag;
    }
    if let Some(flag) = metadata.generate_ddl {
        config.generate_ddl = flag;
    }

    if let Some(module) = metadata.domain_module {
        config.domain_module = module;
    }
    if let Some(module) = metadata.vo_module {
        config.vo_module = module;
    }
    if let Some(krate) = metadata.runtime_crate {
        config.runtime_crate = krate;
    }
    if let Some(strategy) = metadata.route_pattern_strategy {
        config.route_pattern_strategy = strategy;
    }
    config.service_env = metadata.service_env;
    if let Some(policy) = metadata.collision_policy {
        config.collision_policy = policy;
    }
    config.known_types = metadata.known_types;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const USER: &str = r#"
        use rdao::FromRow;

        /// Audit columns
        pub struct Base {
            pub create_at: Option<chrono::NaiveDateTime>,
            pub update_at: Option<chrono::NaiveDateTime>,
        }

        #[derive(FromRow)]
        #[rdao(table = "user")]
        pub struct User {
            pub id: i64,
            pub name: String,
            #[rdao(flatten)]
            pub base: Base,
        }
    "#;

    const ORDER: &str = r#"
        #[rdao(table)]
        pub struct Order {
            pub id: u64,
            pub amount: rust_decimal::Decimal,
        }
    "#;

    const SVC: &str = r#"
        #[rdao::service]
        pub trait Usersvc {
            async fn get_user(&self, ctx: &Context, id: i64) -> Result<UserVo>;
        }
    "#;

    const VO: &str = "pub struct UserVo { pub id: i64, pub name: String }";

    fn workspace() -> (tempfile::TempDir, CodegenConfig) {
        let dir = tempfile::tempdir().unwrap();
        let domain = dir.path().join("domain");
        let vo = dir.path().join("vo");
        fs::create_dir_all(&domain).unwrap();
        fs::create_dir_all(&vo).unwrap();
        fs::write(domain.join("user.rs"), USER).unwrap();
        fs::write(domain.join("order.rs"), ORDER).unwrap();
        fs::write(domain.join("notes.txt"), "not rust").unwrap();
        fs::write(vo.join("vo.rs"), VO).unwrap();
        fs::write(dir.path().join("svc.rs"), SVC).unwrap();

        let config = CodegenBuilder::new(&domain, dir.path().join("svc.rs"))
            .vo_dir(&vo)
            .output_dir(dir.path().join("out"))
            .with_ddl()
            .config()
            .clone();
        (dir, config)
    }

    #[test]
    fn test_load_model() {
        let (_dir, config) = workspace();
        let model = load_model(&config).unwrap();

        // Files are read in path order, Base is not a table
        let tables: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["order", "user"]);
        assert_eq!(model.entities.len(), 4);
        assert_eq!(model.interfaces.len(), 1);

        let user = &model.tables[1];
        let columns: Vec<&str> = user.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "name", "create_at", "update_at"]);
        assert_eq!(user.columns[2].accessor, "base.create_at");
    }

    #[test]
    fn test_generate_writes_every_artifact() {
        let (dir, config) = workspace();
        let artifacts = generate(&config).unwrap();
        assert_eq!(artifacts.len(), 5);

        let out = dir.path().join("out");
        let mod_rs = fs::read_to_string(out.join("dao/mod.rs")).unwrap();
        assert!(mod_rs.contains("pub mod order;"));
        assert!(mod_rs.contains("pub mod user;"));
        assert!(out.join("dao/user.rs").exists());
        assert!(out.join("dao/order.rs").exists());
        assert!(fs::read_to_string(out.join("client/client.rs"))
            .unwrap()
            .contains("pub struct UsersvcClient"));
        assert!(fs::read_to_string(out.join("schema.sql"))
            .unwrap()
            .contains("CREATE TABLE IF NOT EXISTS `order`"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let (_dir, config) = workspace();
        let first = generate(&config).unwrap();
        let second = generate(&config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_failure_writes_nothing() {
        let (dir, config) = workspace();
        fs::write(
            dir.path().join("svc.rs"),
            "pub trait S { async fn a(&self, x: UserVo, y: UserVo) -> Result<()>; }",
        )
        .unwrap();
        assert!(generate(&config).is_err());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_value_objects_never_become_tables() {
        let (dir, config) = workspace();
        fs::write(
            dir.path().join("vo/extra.rs"),
            r#"
            use std::collections::HashMap;

            pub struct Tagged {
                pub id: i64,
                #[serde(flatten)]
                pub extra: HashMap<String, String>,
            }

            pub struct PageRet<T> {
                pub items: Vec<T>,
                pub total: i64,
            }
            "#,
        )
        .unwrap();

        let model = load_model(&config).unwrap();
        let tables: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["order", "user"]);
        assert_eq!(model.entities.len(), 6);
        assert_eq!(generate(&config).unwrap().len(), 5);
    }

    #[test]
    fn test_filter_tables() {
        let (_dir, config) = workspace();
        let config = CodegenConfig {
            exclude_tables: "order".to_string(),
            ..config
        };
        let model = load_model(&config).unwrap();
        assert_eq!(model.tables.len(), 1);
        assert_eq!(model.tables[0].name, "user");

        let config = CodegenConfig {
            include_tables: "order, missing".to_string(),
            exclude_tables: String::new(),
            ..config
        };
        let model = load_model(&config).unwrap();
        assert_eq!(model.tables.len(), 1);
        assert_eq!(model.tables[0].name, "order");
    }

    #[test]
    fn test_config_from_metadata() {
        let metadata: CargoMetadataConfig = toml::from_str(
            r#"
            domain_dir = "src/domain"
            exclude_tables = ["audit"]
            route_pattern_strategy = 1
            collision_policy = "error"
            "#,
        )
        .unwrap();
        let config = config_from_metadata(metadata, Path::new("/crate"), Path::new("/out"));
        assert_eq!(config.domain_dir, PathBuf::from("/crate/src/domain"));
        assert!(!config.generate_client);
        assert_eq!(config.output_dao_dir, PathBuf::from("/out/dao"));
        assert_eq!(config.exclude_tables, "audit");
        assert_eq!(config.route_pattern_strategy, 1);
        assert_eq!(config.collision_policy, CollisionPolicy::Error);
    }
}
