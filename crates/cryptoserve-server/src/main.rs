// ============================================
// File: crates/cryptoserve-server/src/main.rs
// ============================================
//! # Cryptoserve Entry Point
//!
//! ## Creation Reason
//! Main entry point for the Cryptoserve binary.
//! Handles CLI parsing, logging setup, and server initialization.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading with command-line overrides
//! - Exercise discovery and server execution
//!
//! ## Usage
//! ```bash
//! cryptoserve start                           # defaults, or ./cryptoserve.toml
//! cryptoserve start --port 6000 --timeout 30  # override config values
//! cryptoserve validate -c cryptoserve.toml    # check a config file
//! cryptoserve list                            # print the exercise menu
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured log level
//! - A missing config file is not an error; defaults are used
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cryptoserve_exercises::{default_catalog, ExerciseRegistry, Tables};
use cryptoserve_server::greeting;
use cryptoserve_server::{Server, ServerConfig, ServerError};

// ============================================
// CLI Definition
// ============================================

/// Cryptoserve: interactive cryptography exercises over TCP
#[derive(Parser, Debug)]
#[command(name = "cryptoserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the exercise server
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "cryptoserve.toml")]
        config: PathBuf,

        /// Interface to listen on
        #[arg(long)]
        host: Option<IpAddr>,

        /// TCP port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Seconds each send or receive may take
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "cryptoserve.toml")]
        config: PathBuf,
    },

    /// Print the exercise menu peers will see
    List,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start {
            config,
            host,
            port,
            timeout,
        } => cmd_start(config, host, port, timeout).await,
        Commands::Validate { config } => cmd_validate(config).await,
        Commands::List => cmd_list(),
    };

    if let Err(e) = result {
        init_logging("error");
        error!("{}", e);
        if e.downcast_ref::<ServerError>().is_some_and(ServerError::is_config_error) {
            eprintln!("Run `cryptoserve validate --config <path>` for details.");
        }
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

async fn cmd_start(
    config_path: PathBuf,
    host: Option<IpAddr>,
    port: Option<u16>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = load_or_default_config(&config_path).await?;

    if let Some(host) = host {
        config.network.host = host;
    }
    if let Some(port) = port {
        config.network.port = port;
    }
    if let Some(timeout) = timeout {
        config.session.timeout_secs = timeout;
    }
    config.validate()?;

    init_logging(&config.logging.level);
    info!("Starting Cryptoserve...");

    let registry = discover_exercises()?;

    info!("════════════════════════════════════════");
    info!("Listen:     {}", config.listen_addr());
    info!("Timeout:    {}s", config.session.timeout_secs);
    info!("Exercises:  {}", registry.len());
    info!("════════════════════════════════════════");

    let server = Server::new(config, registry);
    server.run().await?;

    Ok(())
}

async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Server will use default values.");
        return Ok(());
    }

    let config = ServerConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:     {}", config.listen_addr());
    println!();
    println!("Session:");
    println!("   Timeout:    {}s", config.session.timeout_secs);
    println!();
    println!("Logging:");
    println!("   Level:      {}", config.logging.level);
    println!();

    Ok(())
}

fn cmd_list() -> anyhow::Result<()> {
    let registry = discover_exercises()?;
    println!("{}", greeting::render(&registry));
    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config, falling back to defaults when the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<ServerConfig> {
    if path.exists() {
        Ok(ServerConfig::load(path).await?)
    } else {
        Ok(ServerConfig::default())
    }
}

/// Computes the tables and discovers the built-in exercises.
fn discover_exercises() -> anyhow::Result<Arc<ExerciseRegistry>> {
    let tables = Arc::new(Tables::compute());
    let registry = ExerciseRegistry::discover(&default_catalog(), &tables);

    if registry.is_empty() {
        return Err(ServerError::NoExercises.into());
    }
    Ok(Arc::new(registry))
}
