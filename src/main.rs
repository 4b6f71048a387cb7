//! Scrape job admin service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    SCRAPE ADMIN                      │
//!   HTTP request  │  ┌────────┐   ┌────────────┐   ┌──────────────────┐  │
//!   ──────────────┼─▶│  http  │──▶│  service   │──▶│ store (load)     │◀─┼── prometheus.yml
//!                 │  └────────┘   │  (RwLock)  │   └──────────────────┘  │
//!                 │               │            │──▶│ engine (mutate)  │  │
//!                 │               │            │   └──────────────────┘  │
//!                 │               │            │──▶│ store (save)     │──┼─▶ prometheus.yml
//!                 │               │            │   └──────────────────┘  │
//!                 │               │            │──▶│ reload (docker)  │──┼─▶ collector restart
//!   JSON envelope │  ┌────────┐   │            │   └──────────────────┘  │
//!   ◀─────────────┼──│response│◀──│            │                         │
//!                 │  └────────┘   └────────────┘                         │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use scrape_admin::config::load_config;
use scrape_admin::lifecycle;
use scrape_admin::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "scrape-admin")]
#[command(about = "HTTP API for managing Prometheus scrape jobs", long_about = None)]
struct Args {
    /// Path to the service configuration file (TOML).
    #[arg(short, long, env = "SCRAPE_ADMIN_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("scrape-admin: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        document = %config.document.path,
        target_ports = ?config.document.target_ports,
        dry_run = config.reload.dry_run,
        "scrape-admin starting"
    );

    match lifecycle::start(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "scrape-admin failed");
            ExitCode::FAILURE
        }
    }
}
