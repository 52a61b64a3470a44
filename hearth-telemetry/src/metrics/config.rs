//! Metrics configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics are collected at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to run a dedicated Prometheus HTTP listener in addition to
    /// the API's `/metrics` route
    #[serde(default)]
    pub expose_endpoint: bool,

    /// Address for the dedicated listener (e.g., "0.0.0.0:9090")
    #[serde(default = "default_endpoint_address")]
    pub endpoint_address: String,

    /// Prefix for all metric names
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Histogram buckets for latency metrics (in seconds)
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expose_endpoint: false,
            endpoint_address: default_endpoint_address(),
            prefix: default_prefix(),
            latency_buckets: default_latency_buckets(),
        }
    }
}

fn default_endpoint_address() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_prefix() -> String {
    "hearth".to_string()
}

fn default_latency_buckets() -> Vec<f64> {
    vec![
        0.0005, // 500µs
        0.001,  // 1ms
        0.005,  // 5ms
        0.01,   // 10ms
        0.05,   // 50ms
        0.1,    // 100ms
        0.5,    // 500ms
        1.0,    // 1s
    ]
}

fn default_true() -> bool {
    true
}
