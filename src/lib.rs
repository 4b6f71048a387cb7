//! Scrape job admin service library.
//!
//! Edits the `scrape_configs` of a Prometheus configuration file over HTTP
//! and restarts the collector so it picks up every change.

pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod service;
pub mod store;

pub use config::ServiceConfig;
pub use engine::ReconcileEngine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::JobService;
pub use store::ConfigStore;
