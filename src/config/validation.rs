//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All errors are collected so
//! an operator can fix a config file in one pass.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }

    if config.document.path.trim().is_empty() {
        errors.push(ValidationError::new("document.path", "must not be empty"));
    }

    match config.document.target_ports.as_slice() {
        [a, b] if *a != 0 && *b != 0 && a != b => {}
        ports => errors.push(ValidationError::new(
            "document.target_ports",
            format!("expected two distinct non-zero ports, got {:?}", ports),
        )),
    }

    if let Some(name) = &config.document.protected_job {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("document.protected_job", "must not be blank when set"));
        }
    }

    let reload = &config.reload;
    if reload.timeout_secs == 0 {
        errors.push(ValidationError::new("reload.timeout_secs", "must be greater than 0"));
    }
    if reload.poll_interval_ms == 0 || reload.poll_interval_ms >= reload.timeout_secs.saturating_mul(1000) {
        errors.push(ValidationError::new(
            "reload.poll_interval_ms",
            "must be greater than 0 and shorter than the reload timeout",
        ));
    }
    if !reload.dry_run {
        if reload.docker_binary.trim().is_empty() {
            errors.push(ValidationError::new("reload.docker_binary", "must not be empty"));
        }
        if reload.container.trim().is_empty() {
            errors.push(ValidationError::new("reload.container", "must not be empty"));
        }
        if reload.label_filter.trim().is_empty() {
            errors.push(ValidationError::new("reload.label_filter", "must not be empty"));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.lock_wait_secs == 0 {
        errors.push(ValidationError::new("timeouts.lock_wait_secs", "must be greater than 0"));
    }
    if timeouts.request_secs <= timeouts.lock_wait_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed timeouts.lock_wait_secs ({}s) so queued reads fail with a response",
                timeouts.lock_wait_secs
            ),
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
