//! Exporter self-telemetry.
//!
//! Operational counters about the exporter itself (batches seen, records
//! skipped, pushes failed), recorded through the `metrics` facade with a
//! Prometheus recorder. These are separate from the Tenzir registry being
//! forwarded: they describe how the forwarding is going.

use std::sync::{Once, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder for self-telemetry. Idempotent.
///
/// The counters land in the handle stored here and are appended to the
/// `/metrics` response, next to the mirrored Tenzir snapshot.
pub fn init_telemetry() {
    INIT.call_once(|| {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("Self-telemetry handle already set");
                }
                describe_all();
                info!("Self-telemetry recorder installed");
            }
            Err(e) => warn!("Failed to install self-telemetry recorder: {}", e),
        }
    });
}

/// Render the exporter's own metrics, if the recorder is installed.
pub fn render_self_metrics() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        "tenzir_exporter_batches_total",
        "Total number of ingest batches received"
    );
    describe_counter!(
        "tenzir_exporter_batch_parse_failures_total",
        "Total number of batches rejected as unparseable"
    );
    describe_counter!(
        "tenzir_exporter_records_total",
        "Total number of records mapped into metric updates"
    );
    describe_counter!(
        "tenzir_exporter_records_unrecognized_total",
        "Total number of records matching no known shape"
    );
    describe_counter!(
        "tenzir_exporter_records_missing_field_total",
        "Total number of records aborted for a missing or invalid field"
    );
    describe_counter!(
        "tenzir_exporter_pushes_total",
        "Total number of successful Pushgateway pushes"
    );
    describe_counter!(
        "tenzir_exporter_push_failures_total",
        "Total number of failed Pushgateway pushes"
    );
    describe_gauge!(
        "tenzir_exporter_last_push_timestamp_ms",
        "Wall-clock time of the last successful push in milliseconds"
    );
}

pub fn record_batch_received() {
    metrics::counter!("tenzir_exporter_batches_total").increment(1);
}

pub fn record_batch_parse_failure() {
    metrics::counter!("tenzir_exporter_batch_parse_failures_total").increment(1);
}

pub fn record_record_mapped() {
    metrics::counter!("tenzir_exporter_records_total").increment(1);
}

pub fn record_record_unrecognized() {
    metrics::counter!("tenzir_exporter_records_unrecognized_total").increment(1);
}

pub fn record_record_missing_field() {
    metrics::counter!("tenzir_exporter_records_missing_field_total").increment(1);
}

pub fn record_push_success() {
    metrics::counter!("tenzir_exporter_pushes_total").increment(1);
    metrics::gauge!("tenzir_exporter_last_push_timestamp_ms")
        .set(chrono::Utc::now().timestamp_millis() as f64);
}

pub fn record_push_failure() {
    metrics::counter!("tenzir_exporter_push_failures_total").increment(1);
}
