//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, middleware:
//!     → logging.rs (structured log events, request-id spans)
//!     → metrics.rs (request counters, latency histogram, rejections)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
