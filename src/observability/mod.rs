//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, service, store, reloader produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → optional Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
