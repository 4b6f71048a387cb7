//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the managed document path.
pub const ENV_DOCUMENT_PATH: &str = "PROMETHEUS_CONFIG_PATH";
/// Overrides the listener port.
pub const ENV_PORT: &str = "PORT";
/// `true` switches reloads to dry-run.
pub const ENV_TEST_MODE: &str = "TEST_MODE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: '{}'", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply process environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Merge environment overrides into `config`.
///
/// `lookup` abstracts the environment so callers (and tests) decide where
/// values come from.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DOCUMENT_PATH).filter(|v| !v.trim().is_empty()) {
        config.document.path = path;
    }

    if let Some(value) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
        let port: u16 = value.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            value: value.clone(),
        })?;
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    if let Some(value) = lookup(ENV_TEST_MODE) {
        config.reload.dry_run = value.trim().eq_ignore_ascii_case("true");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(
            ServiceConfig::default(),
            env(&[
                (ENV_DOCUMENT_PATH, "/srv/prometheus.yml"),
                (ENV_PORT, "9000"),
                (ENV_TEST_MODE, "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.document.path, "/srv/prometheus.yml");
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert!(config.reload.dry_run);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = apply_env_overrides(ServiceConfig::default(), env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PORT, .. }));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape-admin.toml");
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:7070"

            [reload]
            container = "prom"
            "#,
        )
        .unwrap();

        let config = parse_file(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:7070");
        assert_eq!(config.reload.container, "prom");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[listener\nbind_address = 1").unwrap();

        assert!(matches!(parse_file(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            parse_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
