//! Metric shape classification.
//!
//! Tenzir telemetry records carry no type tag; the shape of a record is
//! inferred from which keys it carries, and the key sets overlap (memory
//! and disk records share the `total_bytes` family and differ only in
//! whether `path` is present). Classification is therefore an ordered
//! sequence of discriminator checks, and the result is an explicit enum.
//! There is deliberately no default branch that could turn an unknown
//! record into a memory update.

use serde_json::{Map, Value};

/// The seven known record shapes, one per Tenzir metrics operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricShape {
    /// Partition rebuild progress.
    Rebuild,
    /// Host load averages.
    CpuLoad,
    /// Host memory totals.
    Memory,
    /// Per-process resource usage.
    Process,
    /// Per-mount disk usage.
    Disk,
    /// Data ingested into the database, per schema.
    Ingest,
    /// Per-operator pipeline run timings and throughput.
    Operator,
}

impl MetricShape {
    /// Shape name used in log output and error messages.
    pub fn name(self) -> &'static str {
        match self {
            MetricShape::Rebuild => "rebuild",
            MetricShape::CpuLoad => "cpu-load",
            MetricShape::Memory => "memory",
            MetricShape::Process => "process",
            MetricShape::Disk => "disk",
            MetricShape::Ingest => "ingest",
            MetricShape::Operator => "operator",
        }
    }
}

/// Classify a record by key presence, first match wins.
///
/// The order is load-bearing: memory must be tested before disk (both
/// carry `total_bytes`, only disk has `path`) and ingest before operator
/// (an operator record carries `pipeline_id` and `run`, which an ingest
/// record never does). Returns `None` for a record matching no shape.
pub fn classify(record: &Map<String, Value>) -> Option<MetricShape> {
    if record.contains_key("queued_partitions") {
        Some(MetricShape::Rebuild)
    } else if record.contains_key("loadavg_1m") {
        Some(MetricShape::CpuLoad)
    } else if record.contains_key("total_bytes") && !record.contains_key("path") {
        Some(MetricShape::Memory)
    } else if record.contains_key("swap_space_usage") {
        Some(MetricShape::Process)
    } else if record.contains_key("path") {
        Some(MetricShape::Disk)
    } else if record.contains_key("schema_id")
        && !record.contains_key("run")
        && !record.contains_key("pipeline_id")
    {
        Some(MetricShape::Ingest)
    } else if record.contains_key("pipeline_id") {
        Some(MetricShape::Operator)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn classifies_each_shape_by_discriminating_keys() {
        let cases = [
            (json!({"partitions": 1, "queued_partitions": 2}), MetricShape::Rebuild),
            (json!({"loadavg_1m": 0.5, "loadavg_5m": 0.4, "loadavg_15m": 0.3}), MetricShape::CpuLoad),
            (json!({"total_bytes": 100, "used_bytes": 40, "free_bytes": 60}), MetricShape::Memory),
            (json!({"swap_space_usage": 0, "open_fds": 12}), MetricShape::Process),
            (json!({"path": "/data", "total_bytes": 500}), MetricShape::Disk),
            (json!({"schema": "suricata", "schema_id": "ab12", "events": 9}), MetricShape::Ingest),
            (json!({"pipeline_id": "p1", "run": 1}), MetricShape::Operator),
        ];
        for (value, expected) in cases {
            assert_eq!(classify(&record(value)), Some(expected), "shape {:?}", expected);
        }
    }

    #[test]
    fn path_beats_memory() {
        // A disk record carries the whole total_bytes family; the path
        // key alone must keep it out of the memory shape.
        let rec = record(json!({
            "path": "/var/lib/tenzir",
            "total_bytes": 500,
            "used_bytes": 200,
            "free_bytes": 300
        }));
        assert_eq!(classify(&rec), Some(MetricShape::Disk));
    }

    #[test]
    fn key_order_does_not_matter() {
        let forward = record(json!({"total_bytes": 1, "used_bytes": 2, "free_bytes": 3}));
        let reversed = record(json!({"free_bytes": 3, "used_bytes": 2, "total_bytes": 1}));
        assert_eq!(classify(&forward), classify(&reversed));
    }

    #[test]
    fn operator_record_is_not_ingest() {
        // Operator records carry schema-free pipeline context; an ingest
        // record with a run counter would be an operator record.
        let rec = record(json!({
            "pipeline_id": "p1",
            "schema_id": "ab12",
            "run": 3
        }));
        assert_eq!(classify(&rec), Some(MetricShape::Operator));
    }

    #[test]
    fn unknown_record_classifies_to_none() {
        assert_eq!(classify(&record(json!({"a": 1}))), None);
        assert_eq!(classify(&record(json!({}))), None);
    }

    #[test]
    fn rebuild_takes_priority() {
        let rec = record(json!({"queued_partitions": 4, "partitions": 2, "loadavg_1m": 0.1}));
        assert_eq!(classify(&rec), Some(MetricShape::Rebuild));
    }
}
