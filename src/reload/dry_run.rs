//! Reloader that only logs.

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::reload::{ReloadController, ReloadError};

/// Treats every saved document as already live.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunReloader;

impl ReloadController for DryRunReloader {
    fn mode(&self) -> &'static str {
        "dry-run"
    }

    fn reload_and_verify(&self, _timeout: Duration) -> BoxFuture<'_, Result<(), ReloadError>> {
        Box::pin(async {
            tracing::debug!("Dry-run reload, skipping collector restart");
            Ok(())
        })
    }
}
