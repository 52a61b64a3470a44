//! # Hearth Server
//!
//! Entry point for the Hearth notification service.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! hearth-server
//!
//! # Run with custom configuration file
//! hearth-server --config /etc/hearth/hearth.yaml
//!
//! # Run with environment variable overrides
//! HEARTH_SERVER_PORT=9090 HEARTH_DATABASE_URL=sqlite:hearth.db hearth-server
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use hearth_core::config::Validatable;
use hearth_server::{HearthServer, ServerConfig};

/// Hearth notification server
#[derive(Parser, Debug)]
#[command(name = "hearth-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "hearth.yaml")]
    config: PathBuf,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override server port
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    if args.validate {
        println!("Configuration is valid");
        return;
    }

    match run_server(config).await {
        Ok(()) => {
            info!("Hearth server stopped");
        }
        Err(e) => {
            error!("Server error: {:#}", e);
            eprintln!("Server error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Loads configuration from file and applies command-line overrides.
fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = if args.config.exists() {
        HearthServer::load_config(&args.config)
            .with_context(|| format!("reading {}", args.config.display()))?
    } else {
        eprintln!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );
        HearthServer::default_config()?
    };

    // Command-line flags win over file and environment
    if let Some(host) = &args.host {
        config.api.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Creates and runs the server.
async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let mut server = HearthServer::new(config);
    server.initialize().await?;
    server.run().await?;
    Ok(())
}
