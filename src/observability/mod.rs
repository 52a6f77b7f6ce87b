//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config registry, triggers, sources produce:
//!     → tracing events (rebuilds, reload failures, stops)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape, when the binary enables it
//! ```

pub mod logging;
pub mod metrics;
