//! Persistent storage for the Prometheus document.
//!
//! # Design Decisions
//! - No caching: every request starts from a fresh `load`, so the file is the
//!   single source of truth
//! - `save` writes a sibling temp file, fsyncs it, then renames it over the
//!   original; a crash mid-write leaves the previous document intact
//! - A document that fails to parse is never returned in part

pub mod document;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use document::{JobSummary, PrometheusDocument, RelabelConfig, ScrapeConfig, StaticConfig};

/// Errors raised while reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration file {0} not found")]
    NotFound(PathBuf),

    #[error("configuration file {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("configuration file {path} is unwritable: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and atomically persists the Prometheus document.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    protected_job: Option<String>,
}

impl ConfigStore {
    /// Create a store for `path`. `protected_job` pins the protected entry by
    /// name; without it the first entry is protected.
    pub fn new(path: impl Into<PathBuf>, protected_job: Option<String>) -> Self {
        Self {
            path: path.into(),
            protected_job,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the document, flagging its protected job.
    pub fn load(&self) -> Result<PrometheusDocument, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(self.path.clone()),
            _ => StoreError::Unreadable {
                path: self.path.clone(),
                source: e,
            },
        })?;

        let mut doc: PrometheusDocument = if content.trim().is_empty() {
            PrometheusDocument::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| StoreError::Parse {
                path: self.path.clone(),
                source: e,
            })?
        };

        let protected = doc.mark_protected(self.protected_job.as_deref());
        if let Some(wanted) = self.protected_job.as_deref() {
            if protected != Some(wanted) {
                tracing::warn!(
                    path = %self.path.display(),
                    protected_job = %wanted,
                    fallback = ?protected,
                    "Protected job not present in document; protecting the first entry"
                );
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            jobs = doc.scrape_configs.len(),
            "Document loaded"
        );
        Ok(doc)
    }

    /// Encode and atomically replace the document on disk.
    pub fn save(&self, doc: &PrometheusDocument) -> Result<(), StoreError> {
        let encoded = serde_yaml::to_string(doc).map_err(StoreError::Serialize)?;
        self.write_atomic(encoded.as_bytes()).map_err(|e| StoreError::Unwritable {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            jobs = doc.scrape_configs.len(),
            bytes = encoded.len(),
            "Document saved"
        );
        Ok(())
    }

    fn write_atomic(&self, data: &[u8]) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        // Same directory keeps the rename on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.flush()?;

        // The collector reads this file too; keep whatever mode it had.
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
