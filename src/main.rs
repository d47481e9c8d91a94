//! Multi-tenant web front.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ trace → request id → timeout
//!                          │
//!                          ▼
//!                   ┌──────────────┐   301 /<default>/...
//!                   │    locale    │─────────────────────▶
//!                   └──────┬───────┘
//!                          ▼
//!                   ┌──────────────┐   cached page
//!                   │  page cache  │─────────────────────▶
//!                   └──────┬───────┘
//!                          ▼ (miss / refresh)
//!                   ┌──────────────┐
//!                   │ route table  │  host filter, per-tenant endpoints
//!                   └──────┬───────┘
//!                          ▼
//!                   ┌──────────────┐
//!                   │  dispatcher  │  controller → action → view
//!                   └──────┬───────┘
//!                          ▼
//!     ◀──────────── rendered page (written back to the cache)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use domain_front::config::{load_config, watcher::ConfigWatcher, AppConfig};
use domain_front::lifecycle::signals::spawn_signal_handler;
use domain_front::observability::{logging, metrics};
use domain_front::pages::BatchGenerator;
use domain_front::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "domain-front")]
#[command(about = "Multi-tenant web front with an on-disk page cache", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "domain-front.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve HTTP traffic (default)
    Serve,
    /// Regenerate cached pages for one tenant
    Generate {
        /// Tenant host, as it appears in the Host header
        #[arg(long)]
        host: String,
        /// Canonical page paths, e.g. /en/index.html
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        config = %cli.config.display(),
        tenants = config.tenants.len(),
        route_templates = config.route_templates.len(),
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve(cli.config, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate { host, paths } => generate(config, &host, &paths).await,
    }
}

async fn serve(config_path: PathBuf, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (watcher, config_updates) = ConfigWatcher::new(&config_path);
    // dropping the handle stops watching
    let _watch = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn generate(config: AppConfig, host: &str, paths: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let server = HttpServer::new(config)?;
    let outcomes = BatchGenerator::new(server.router()).generate(host, paths).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match (&outcome.written, &outcome.location) {
            (Some(file), _) => println!("{}\t{}\t{}", outcome.status.as_u16(), outcome.path, file.display()),
            (None, Some(location)) => println!("{}\t{}\t-> {}", outcome.status.as_u16(), outcome.path, location),
            (None, None) => println!("{}\t{}", outcome.status.as_u16(), outcome.path),
        }
        if !outcome.is_success() {
            failed += 1;
        }
    }

    tracing::info!(pages = outcomes.len(), failed, "Batch generation finished");
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
