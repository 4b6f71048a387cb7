//! Configuration schema definitions.
//!
//! This module defines the settings of the admin service itself. The
//! Prometheus document it manages is modelled separately in
//! [`crate::store::document`].

use serde::{Deserialize, Serialize};

/// Root configuration for the scrape admin service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Managed Prometheus document settings.
    pub document: DocumentConfig,

    /// Collector reload settings.
    pub reload: ReloadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Where the Prometheus document lives and how jobs are shaped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Path of the Prometheus configuration file.
    pub path: String,

    /// The two ports every managed address is scraped on.
    pub target_ports: Vec<u16>,

    /// Name of the job that is never listed, edited or removed.
    /// Falls back to the first entry of the document when unset.
    pub protected_job: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: "prometheus.yml".to_string(),
            target_ports: vec![26, 27],
            protected_job: None,
        }
    }
}

/// Collector reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Skip the restart entirely and treat saved documents as live.
    pub dry_run: bool,

    /// Path to the docker CLI.
    pub docker_binary: String,

    /// Container restarted after every change.
    pub container: String,

    /// Label used to find the collector container when checking its state.
    pub label_filter: String,

    /// Upper bound for restart plus verification, in seconds.
    pub timeout_secs: u64,

    /// Delay between status polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            docker_binary: "/usr/bin/docker".to_string(),
            container: "prometheus_prometheus_1".to_string(),
            label_filter: "app=prometheus".to_string(),
            timeout_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for read-only requests in seconds. Mutations are bounded by
    /// the lock wait plus the reload timeout instead.
    pub request_secs: u64,

    /// How long a request may queue for the document lock, in seconds.
    pub lock_wait_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            lock_wait_secs: 45,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.document.target_ports, vec![26, 27]);
        assert_eq!(config.reload.container, "prometheus_prometheus_1");
        assert!(!config.reload.dry_run);
        assert!(config.timeouts.request_secs > config.timeouts.lock_wait_secs);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [document]
            path = "/etc/prometheus/prometheus.yml"

            [reload]
            dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(config.document.path, "/etc/prometheus/prometheus.yml");
        assert_eq!(config.document.target_ports, vec![26, 27]);
        assert!(config.reload.dry_run);
        assert_eq!(config.reload.timeout_secs, 30);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
