//! # Hearth Telemetry
//!
//! Logging and metrics for the Hearth notification service.
//!
//! - **Structured Logging**: `tracing` with JSON or pretty output, optional
//!   rolling log files
//! - **Metrics**: Prometheus-compatible counters and gauges for notification
//!   creation and live delivery

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Metrics collection and export
pub mod metrics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, init_logging};
    pub use crate::metrics::{HearthMetrics, MetricsConfig, init_metrics, render_metrics};
}
