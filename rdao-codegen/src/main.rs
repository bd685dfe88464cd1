//! CLI entry point for rdao-codegen

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rdao_codegen::config::CodegenConfig;

#[derive(Parser)]
#[command(name = "rdao-codegen")]
#[command(about = "Generate rdao DAOs, HTTP service clients and DDL from annotated Rust declarations")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format, RDAO_CODEGEN_* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of entity declarations (overrides config)
    #[arg(short, long)]
    domain: Option<PathBuf>,

    /// File declaring the service trait (overrides config)
    #[arg(short, long)]
    svc: Option<PathBuf>,

    /// Directory of value-object declarations (overrides config)
    #[arg(long)]
    vo: Option<PathBuf>,

    /// Output directory (overrides config, sets dao, client and DDL outputs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run - show what would be generated without writing files
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate everything enabled in the configuration
    Generate,
    /// Generate only DAOs
    Dao,
    /// Generate only the service client
    Client,
    /// Generate only the DDL script
    Ddl,
    /// Print the extracted model as JSON (for debugging)
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = CodegenConfig::load(cli.config.as_deref())?;

    // Priority: RUST_LOG env var > --log-level > config.log_level > default
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Apply CLI overrides
    if let Some(domain) = cli.domain {
        config.domain_dir = domain;
    }
    if let Some(svc) = cli.svc {
        config.svc_file = svc;
    }
    if let Some(vo) = cli.vo {
        config.vo_dir = Some(vo);
    }
    if let Some(output) = cli.output {
        config.output_dao_dir = output.join("dao");
        config.output_client_dir = output.join("client");
        config.output_ddl_file = output.join("schema.sql");
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    // Apply command-specific settings
    match &cli.command {
        Some(Commands::Dao) => {
            config.generate_dao = true;
            config.generate_client = false;
            config.generate_ddl = false;
        }
        Some(Commands::Client) => {
            config.generate_dao = false;
            config.generate_client = true;
            config.generate_ddl = false;
        }
        Some(Commands::Ddl) => {
            config.generate_dao = false;
            config.generate_client = false;
            config.generate_ddl = true;
        }
        Some(Commands::Inspect) => {
            return inspect(&config);
        }
        Some(Commands::Generate) | None => {}
    }

    info!(
        "Generating code from domain {:?} and service {:?}",
        config.domain_dir, config.svc_file
    );

    let artifacts = rdao_codegen::generate(&config)?;

    if config.dry_run {
        println!("Dry run mode - would generate:");
        for artifact in &artifacts {
            println!("  {}", artifact.path.display());
        }
        return Ok(());
    }

    info!("Code generation completed successfully");
    Ok(())
}

fn inspect(config: &CodegenConfig) -> Result<()> {
    let model = rdao_codegen::load_model(config)?;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}
