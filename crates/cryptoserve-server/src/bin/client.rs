// ============================================
// File: crates/cryptoserve-server/src/bin/client.rs
// ============================================
//! # Cryptoserve Client
//!
//! ## Creation Reason
//! Peer-side companion to the server binary for trying an exercise from
//! the command line.
//!
//! ## Usage
//! ```bash
//! cryptoserve-client --select "Simple Hash" \
//!     --step text:Apple --step recv \
//!     --step send:4170706c65000000 --step recv
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial client

use std::time::Duration;

use clap::Parser;
use tokio::net::TcpStream;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cryptoserve_server::client::{self, Step};
use cryptoserve_transport::Channel;

/// Scripted client for a Cryptoserve server
#[derive(Parser, Debug)]
#[command(name = "cryptoserve-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 5050)]
    port: u16,

    /// Seconds to wait for each message
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    /// Exercise number or name to select
    #[arg(short, long)]
    select: String,

    /// Script step: send:<hex>, text:<utf8> or recv (repeatable)
    #[arg(long = "step")]
    steps: Vec<Step>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging("warn");

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` if the server ended the session with an error report.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let stream = TcpStream::connect((cli.host.as_str(), cli.port)).await?;
    let mut channel = Channel::new(stream, Duration::from_secs(cli.timeout));

    let transcript = client::run(&mut channel, &cli.select, &cli.steps).await;
    channel.close().await;
    let transcript = transcript?;

    for entry in &transcript.entries {
        println!("{entry}");
    }
    Ok(transcript.report.is_none())
}

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}
