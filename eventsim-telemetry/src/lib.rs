//! # eventsim Telemetry
//!
//! Logging setup and Prometheus counters for simulation runs.

pub mod logging;
pub mod metrics;

pub use logging::{EventLogger, LoggingError};
pub use metrics::MetricsRecorder;
