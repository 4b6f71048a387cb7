//! Collector reload subsystem.
//!
//! # Data Flow
//! ```text
//! document saved
//!     → ReloadController::reload_and_verify(timeout)
//!         docker.rs: restart container → poll running state
//!         dry_run.rs: no-op
//!     → Ok(()) only once the collector reports running
//! ```
//!
//! # Design Decisions
//! - The whole reload is bounded by one deadline; commands still running at
//!   the deadline are killed
//! - No retries: a failed reload is surfaced so an operator can intervene

pub mod docker;
pub mod dry_run;
pub mod runner;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::ReloadConfig;

pub use docker::DockerReloader;
pub use dry_run::DryRunReloader;

/// Errors produced while reloading or verifying the collector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReloadError {
    /// A command could not be run, failed, or printed something unexpected.
    #[error("command `{command}` failed: {output}")]
    ExecFailed { command: String, output: String },

    /// The collector did not report a running state after the restart.
    #[error("collector is not active after restart")]
    NotActive,

    /// The reload did not finish within its deadline.
    #[error("collector reload timed out after {0:?}")]
    Timeout(Duration),
}

/// Restarts the external collector and confirms it came back.
pub trait ReloadController: Send + Sync {
    /// Short label for logs and metrics.
    fn mode(&self) -> &'static str;

    /// Restart the collector and wait, at most `timeout`, for it to run.
    fn reload_and_verify(&self, timeout: Duration) -> BoxFuture<'_, Result<(), ReloadError>>;
}

/// Pick the controller described by `config`.
pub fn from_config(config: &ReloadConfig) -> Arc<dyn ReloadController> {
    if config.dry_run {
        tracing::warn!("Reload dry-run enabled; collector will not be restarted");
        Arc::new(DryRunReloader)
    } else {
        Arc::new(DockerReloader::from_config(config))
    }
}
