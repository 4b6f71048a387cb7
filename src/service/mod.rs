//! Request-level orchestration.
//!
//! # State Machine (mutating requests)
//! ```text
//! Idle → Loaded → Validated → Persisted → Reloaded → Done
//!          │          │           │           │
//!          └─ Store   └─ Job      └─ Store    └─ Reload   (terminal, no retry)
//! ```
//!
//! One `RwLock` guards the document file. Mutations hold the write half
//! across load, mutate, save and reload so concurrent requests cannot lose
//! updates or interleave restarts. Reads share the read half.
//!
//! Waiting for the lock is bounded. A request that cannot get it in time
//! fails with [`ServiceError::Busy`] before the document is read, so a
//! mutation is either rejected untouched or runs to a reload outcome.
//! File I/O runs on the blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ServiceConfig;
use crate::engine::{JobError, ReconcileEngine};
use crate::observability::metrics;
use crate::reload::{self, ReloadController, ReloadError};
use crate::store::{ConfigStore, JobSummary, PrometheusDocument, StoreError};

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Job(#[from] JobError),

    /// The document on disk changed but the collector did not pick it up.
    #[error("configuration persisted but collector not reloaded: {0}")]
    Reload(#[source] ReloadError),

    /// Other requests held the document for longer than the lock wait.
    #[error("configuration is busy; gave up after waiting {0:?}")]
    Busy(Duration),

    #[error("document I/O task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Drives load → mutate → save → reload for every request.
pub struct JobService {
    store: ConfigStore,
    engine: ReconcileEngine,
    reloader: Arc<dyn ReloadController>,
    reload_timeout: Duration,
    lock_wait: Duration,
    lock: RwLock<()>,
}

impl JobService {
    pub fn new(
        store: ConfigStore,
        engine: ReconcileEngine,
        reloader: Arc<dyn ReloadController>,
        reload_timeout: Duration,
        lock_wait: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            reloader,
            reload_timeout,
            lock_wait,
            lock: RwLock::new(()),
        }
    }

    /// Wire a service from configuration, using the configured reloader.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::with_reloader(config, reload::from_config(&config.reload))
    }

    /// Wire a service from configuration with an explicit reloader.
    pub fn with_reloader(config: &ServiceConfig, reloader: Arc<dyn ReloadController>) -> Self {
        Self::new(
            ConfigStore::new(&config.document.path, config.document.protected_job.clone()),
            ReconcileEngine::from_ports(&config.document.target_ports),
            reloader,
            Duration::from_secs(config.reload.timeout_secs),
            Duration::from_secs(config.timeouts.lock_wait_secs),
        )
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn reload_mode(&self) -> &'static str {
        self.reloader.mode()
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, ServiceError> {
        let _guard = self.read_lock().await?;
        let doc = self.load().await?;
        let jobs = self.engine.list_jobs(&doc);
        metrics::record_managed_jobs(jobs.len());
        Ok(jobs)
    }

    pub async fn search_by_address(&self, needle: &str) -> Result<Vec<JobSummary>, ServiceError> {
        let _guard = self.read_lock().await?;
        let doc = self.load().await?;
        Ok(self.engine.search_by_address(&doc, needle)?)
    }

    pub async fn add_job(&self, name: &str, address: &str) -> Result<JobSummary, ServiceError> {
        let _guard = self.write_lock().await?;

        let mut doc = self.load().await?;
        let job = self.engine.add_job(&mut doc, name, address).inspect_err(|e| {
            tracing::info!(job = %name, address = %address, reason = %e, "Add rejected");
        })?;
        let doc = self.save(doc).await?;
        tracing::info!(job = %job.job_name, address = %address, "Job persisted");

        self.reload().await?;
        metrics::record_managed_jobs(self.engine.list_jobs(&doc).len());
        Ok(job)
    }

    pub async fn remove_job(&self, name: &str) -> Result<String, ServiceError> {
        let _guard = self.write_lock().await?;

        let mut doc = self.load().await?;
        let removed = self.engine.remove_job(&mut doc, name)?;
        let doc = self.save(doc).await?;
        tracing::info!(job = %removed, "Job removal persisted");

        self.reload().await?;
        metrics::record_managed_jobs(self.engine.list_jobs(&doc).len());
        Ok(removed)
    }

    async fn read_lock(&self) -> Result<RwLockReadGuard<'_, ()>, ServiceError> {
        tokio::time::timeout(self.lock_wait, self.lock.read())
            .await
            .map_err(|_| self.busy())
    }

    async fn write_lock(&self) -> Result<RwLockWriteGuard<'_, ()>, ServiceError> {
        tokio::time::timeout(self.lock_wait, self.lock.write())
            .await
            .map_err(|_| self.busy())
    }

    fn busy(&self) -> ServiceError {
        tracing::warn!(waited_ms = self.lock_wait.as_millis() as u64, "Gave up waiting for the document lock");
        ServiceError::Busy(self.lock_wait)
    }

    async fn load(&self) -> Result<PrometheusDocument, ServiceError> {
        let store = self.store.clone();
        Ok(tokio::task::spawn_blocking(move || store.load()).await??)
    }

    /// Persist `doc` and hand it back for post-save bookkeeping.
    async fn save(&self, doc: PrometheusDocument) -> Result<PrometheusDocument, ServiceError> {
        let store = self.store.clone();
        let doc = tokio::task::spawn_blocking(move || store.save(&doc).map(|()| doc)).await??;
        Ok(doc)
    }

    /// Caller must hold the write lock.
    async fn reload(&self) -> Result<(), ServiceError> {
        let start = Instant::now();
        match self.reloader.reload_and_verify(self.reload_timeout).await {
            Ok(()) => {
                metrics::record_reload("success", start);
                tracing::info!(
                    mode = self.reloader.mode(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Collector reloaded"
                );
                Ok(())
            }
            Err(e) => {
                let outcome = match e {
                    ReloadError::ExecFailed { .. } => "exec_failed",
                    ReloadError::NotActive => "not_active",
                    ReloadError::Timeout(_) => "timeout",
                };
                metrics::record_reload(outcome, start);
                tracing::error!(
                    mode = self.reloader.mode(),
                    path = %self.store.path().display(),
                    error = %e,
                    "Collector reload failed; persisted document and live collector have diverged"
                );
                Err(ServiceError::Reload(e))
            }
        }
    }
}
