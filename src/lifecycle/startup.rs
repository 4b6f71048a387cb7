//! Startup orchestration.
//!
//! Fail fast: the managed document must load before the listener binds, so
//! a misconfigured path is reported at boot instead of on the first request.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::service::JobService;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("managed document unusable: {0}")]
    Document(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bring the service up and serve until a shutdown signal arrives.
pub async fn start(config: ServiceConfig) -> Result<(), StartupError> {
    let service = Arc::new(JobService::from_config(&config));

    let doc = service.store().load()?;
    tracing::info!(
        path = %service.store().path().display(),
        jobs = doc.scrape_configs.len(),
        protected = ?doc.scrape_configs.iter().find(|j| j.protected).map(|j| &j.job_name),
        reload_mode = service.reload_mode(),
        "Managed document loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|e| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source: e,
        })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::with_service(config, service)
        .run(listener, shutdown)
        .await
        .map_err(StartupError::Serve)
}
