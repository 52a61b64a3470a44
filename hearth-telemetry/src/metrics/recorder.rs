//! Hearth metrics recorder with pre-defined metrics.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Pre-defined metrics for the notification service.
///
/// All metrics follow the naming convention: `hearth_<category>_<metric>_<unit>`
pub struct HearthMetrics;

impl HearthMetrics {
    /// Register all metric descriptions.
    pub fn register() {
        // Notification metrics
        describe_counter!(
            "hearth_notification_created_total",
            "Total number of notifications persisted"
        );
        describe_counter!(
            "hearth_notification_marked_read_total",
            "Total number of notifications transitioned to read"
        );

        // Push metrics
        describe_counter!(
            "hearth_push_delivered_total",
            "Total number of live pushes enqueued to a connection"
        );
        describe_counter!(
            "hearth_push_dropped_total",
            "Total number of live pushes that could not be enqueued"
        );

        // Connection metrics
        describe_gauge!(
            "hearth_ws_connections",
            "Number of open notification WebSocket connections"
        );
        describe_counter!(
            "hearth_ws_rejected_total",
            "Total number of WebSocket connections rejected for missing identity"
        );

        // Store metrics
        describe_histogram!(
            "hearth_store_operation_latency_seconds",
            "Notification store operation latency"
        );
    }

    // ==================== Notification Metrics ====================

    /// Record a persisted notification.
    pub fn notification_created(kind: &str) {
        counter!(
            "hearth_notification_created_total",
            "kind" => kind.to_string()
        )
        .increment(1);
    }

    /// Record notifications flipped from unread to read.
    pub fn notifications_marked_read(count: u64) {
        counter!("hearth_notification_marked_read_total").increment(count);
    }

    // ==================== Push Metrics ====================

    /// Record pushes that reached a connection queue.
    pub fn push_delivered(count: u64) {
        counter!("hearth_push_delivered_total").increment(count);
    }

    /// Record pushes that were dropped, e.g. `"queue_full"` or `"closed"`.
    pub fn push_dropped(reason: &str, count: u64) {
        counter!(
            "hearth_push_dropped_total",
            "reason" => reason.to_string()
        )
        .increment(count);
    }

    // ==================== Connection Metrics ====================

    /// Record a connection entering the open state.
    pub fn ws_connection_opened() {
        gauge!("hearth_ws_connections").increment(1.0);
    }

    /// Record a connection leaving the open state.
    pub fn ws_connection_closed() {
        gauge!("hearth_ws_connections").decrement(1.0);
    }

    /// Record a connection refused for lack of identity.
    pub fn ws_rejected() {
        counter!("hearth_ws_rejected_total").increment(1);
    }

    // ==================== Store Metrics ====================

    /// Record store operation latency.
    pub fn store_latency(backend: &str, operation: &str, latency_seconds: f64) {
        histogram!(
            "hearth_store_operation_latency_seconds",
            "backend" => backend.to_string(),
            "operation" => operation.to_string()
        )
        .record(latency_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the calls don't panic without an installed recorder.

    #[test]
    fn test_notification_metrics() {
        HearthMetrics::notification_created("info");
        HearthMetrics::notifications_marked_read(3);
    }

    #[test]
    fn test_push_metrics() {
        HearthMetrics::push_delivered(2);
        HearthMetrics::push_dropped("queue_full", 1);
        HearthMetrics::push_dropped("closed", 1);
    }

    #[test]
    fn test_connection_metrics() {
        HearthMetrics::ws_connection_opened();
        HearthMetrics::ws_connection_closed();
        HearthMetrics::ws_rejected();
    }

    #[test]
    fn test_store_metrics() {
        HearthMetrics::store_latency("memory", "create", 0.0001);
    }
}
