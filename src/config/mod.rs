//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PROMETHEUS_CONFIG_PATH, PORT, TEST_MODE)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! This is the configuration of the service itself. The Prometheus document
//! it edits is re-read from disk on every request by [`crate::store`].

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::DocumentConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ReloadConfig;
pub use schema::ServiceConfig;
