//! Prometheus metrics for the watcher.
//!
//! All metrics are aggregated in the [`Metrics`] struct.

use crate::BridgeStatus;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the watcher.
///
/// Metric descriptions are registered with the global registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Events
        describe_counter!(
            "bridge_delayed_messages_total",
            "Delayed messages observed on the bridge by kind"
        );
        describe_counter!(
            "bridge_batches_total",
            "Sequencer batches observed by data location"
        );
        describe_counter!(
            "bridge_subscription_errors_total",
            "Subscriptions that ended with an error, by stream"
        );

        // Counters refreshed from contract views
        describe_gauge!(
            "bridge_delayed_message_count",
            "delayedMessageCount on the bridge"
        );
        describe_gauge!(
            "bridge_sequencer_message_count",
            "sequencerMessageCount on the bridge"
        );
        describe_gauge!("bridge_batch_count", "batchCount on the sequencer inbox");
        describe_gauge!(
            "bridge_delayed_messages_read",
            "totalDelayedMessagesRead on the sequencer inbox"
        );
        describe_gauge!(
            "bridge_delayed_messages_pending",
            "Delayed messages not yet read by the sequencer"
        );
        describe_gauge!(
            "bridge_outbox_send_count",
            "Size of the latest confirmed send tree"
        );
        describe_gauge!("bridge_inbox_paused", "1 when the inbox is paused");

        describe_counter!(
            "bridge_refresh_failure_total",
            "Failed status refreshes"
        );
        describe_histogram!(
            "bridge_refresh_duration_seconds",
            "Duration of each status refresh in seconds"
        );
    }

    pub fn record_delayed_message(&self, kind: &str) {
        counter!("bridge_delayed_messages_total", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_batch(&self, data_location: &str) {
        counter!("bridge_batches_total", "location" => data_location.to_string()).increment(1);
    }

    pub fn record_subscription_error(&self, stream: &str) {
        counter!("bridge_subscription_errors_total", "stream" => stream.to_string()).increment(1);
    }

    /// Record a completed status refresh.
    pub fn record_refresh(&self, status: &BridgeStatus, duration: Duration) {
        histogram!("bridge_refresh_duration_seconds").record(duration.as_secs_f64());

        gauge!("bridge_delayed_message_count").set(status.delayed_message_count as f64);
        gauge!("bridge_sequencer_message_count").set(status.sequencer_message_count as f64);
        gauge!("bridge_batch_count").set(status.batch_count as f64);
        gauge!("bridge_delayed_messages_read").set(status.total_delayed_messages_read as f64);
        gauge!("bridge_delayed_messages_pending").set(status.pending_delayed_messages() as f64);
        gauge!("bridge_outbox_send_count").set(status.send_count as f64);
        gauge!("bridge_inbox_paused").set(if status.inbox_paused { 1.0 } else { 0.0 });
    }

    pub fn record_refresh_failure(&self) {
        counter!("bridge_refresh_failure_total").increment(1);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
