//! Static catalog of every metric this exporter publishes.
//!
//! One descriptor per exported series: name, kind, help text and the
//! declared label schema. The mapper emits updates against these names
//! and the registry renders exposition `# HELP`/`# TYPE` headers from
//! them, so the catalog is the single place where a metric's identity
//! lives.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Exported metric kinds. Gauges hold the last-set number; info metrics
/// hold textual identity fields and render as a constant `1` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Info,
}

/// Descriptor for one exported metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricDesc {
    pub name: &'static str,
    pub kind: MetricKind,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

const fn gauge(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> MetricDesc {
    MetricDesc { name, kind: MetricKind::Gauge, help, labels }
}

const fn info(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> MetricDesc {
    MetricDesc { name, kind: MetricKind::Info, help, labels }
}

/// All exported Tenzir metrics, grouped by record shape.
pub const CATALOG: &[MetricDesc] = &[
    // Memory
    gauge("tenzir_memory_total_bytes", "Memory total bytes", &[]),
    gauge("tenzir_memory_used_bytes", "Memory used bytes", &[]),
    gauge("tenzir_memory_free_bytes", "Memory free bytes", &[]),
    // CPU
    gauge("tenzir_loadavg_1m", "Load average 1m", &[]),
    gauge("tenzir_loadavg_5m", "Load average 5m", &[]),
    gauge("tenzir_loadavg_15m", "Load average 15m", &[]),
    // Process
    gauge("tenzir_swap_space_usage", "Swap space usage", &[]),
    gauge("tenzir_open_fds", "Open file descriptors", &[]),
    gauge("tenzir_current_memory_usage", "Current memory usage", &[]),
    gauge("tenzir_peak_memory_usage", "Peak memory usage", &[]),
    // Disk
    gauge("tenzir_disk_total_bytes", "Disk total bytes", &["path"]),
    gauge("tenzir_disk_used_bytes", "Disk used bytes", &["path"]),
    gauge("tenzir_disk_free_bytes", "Disk free bytes", &["path"]),
    // Ingest
    info("tenzir_ingest_schema", "Ingest schema name", &[]),
    info("tenzir_ingest_schema_id", "Ingest schema ID", &[]),
    gauge("tenzir_ingest_events", "Ingested events", &[]),
    // Operator
    gauge(
        "tenzir_operator_run",
        "The number of the run, starting at 1 for the first run",
        &["pipeline_id"],
    ),
    gauge("tenzir_operator_duration", "Operator duration", &["pipeline_id"]),
    gauge(
        "tenzir_operator_starting_duration",
        "Operator starting duration",
        &["pipeline_id"],
    ),
    gauge(
        "tenzir_operator_processing_duration",
        "Operator processing duration",
        &["pipeline_id"],
    ),
    gauge(
        "tenzir_operator_scheduled_duration",
        "Operator scheduled duration",
        &["pipeline_id"],
    ),
    gauge(
        "tenzir_operator_running_duration",
        "Operator running duration",
        &["pipeline_id"],
    ),
    gauge(
        "tenzir_operator_paused_duration",
        "Operator paused duration",
        &["pipeline_id"],
    ),
    gauge(
        "tenzir_operator_input_elements",
        "Operator input elements",
        &["pipeline_id", "unit"],
    ),
    gauge(
        "tenzir_operator_output_elements",
        "Operator output elements",
        &["pipeline_id", "unit"],
    ),
    gauge(
        "tenzir_operator_input_bytes",
        "Operator input approximate bytes",
        &["pipeline_id", "unit"],
    ),
    gauge(
        "tenzir_operator_output_bytes",
        "Operator output approximate bytes",
        &["pipeline_id", "unit"],
    ),
    info("tenzir_operator_input_unit", "Pipeline input unit", &["pipeline_id"]),
    info("tenzir_operator_output_unit", "Pipeline output unit", &["pipeline_id"]),
    info("tenzir_operator_pipeline_id", "Pipeline ID", &[]),
    // Rebuild
    gauge(
        "tenzir_rebuild_partitions",
        "The number of partitions currently being rebuilt",
        &[],
    ),
    gauge(
        "tenzir_rebuild_queued_partitions",
        "The number of partitions currently queued for rebuilding",
        &[],
    ),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static MetricDesc>> =
    Lazy::new(|| CATALOG.iter().map(|desc| (desc.name, desc)).collect());

/// Look up a descriptor by metric name.
pub fn describe(name: &str) -> Option<&'static MetricDesc> {
    BY_NAME.get(name).copied()
}
