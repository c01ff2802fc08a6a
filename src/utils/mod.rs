//! # Utility Modules
//!
//! Supporting utilities for logging, metrics and deadlines.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup driven by `LoggingConfig`
//! - **Metrics**: thread-safe classification counters
//! - **Timeout**: async deadline wrapper for the matching phase

pub mod logging;
pub mod metrics;
pub mod timeout;

pub use metrics::{global_metrics, Metrics, MetricsSnapshot};
