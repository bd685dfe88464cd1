//! Default configuration values - single source of truth

/// Default include tables pattern (all tables)
pub const INCLUDE_TABLES: &str = "*";

/// Default exclude tables pattern (none)
pub const EXCLUDE_TABLES: &str = "";

/// Whether to generate DAO files by default
pub const GENERATE_DAO: bool = true;

/// Whether to generate the service client by default
pub const GENERATE_CLIENT: bool = true;

/// Whether to generate the DDL script by default
pub const GENERATE_DDL: bool = false;

/// Default output directory for DAOs
pub const OUTPUT_DAO_DIR: &str = "./generated/dao";

/// Default output directory for the client
pub const OUTPUT_CLIENT_DIR: &str = "./generated/client";

/// Default DDL script path
pub const OUTPUT_DDL_FILE: &str = "./generated/schema.sql";

/// Default module path entities are imported from
pub const DOMAIN_MODULE: &str = "crate::domain";

/// Default module path value objects are imported from
pub const VO_MODULE: &str = "crate::vo";

/// Crate path generated code uses for the runtime
pub const RUNTIME_CRATE: &str = "rdao";

/// Default routing-pattern strategy (split method names into words)
pub const ROUTE_PATTERN_STRATEGY: i32 = 0;

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;
