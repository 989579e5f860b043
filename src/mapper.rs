//! Record-to-instruction mapping.
//!
//! Given one classified record, the mapper extracts the fields that
//! shape consumes and produces the full list of metric updates for it.
//! Mapping is all-or-nothing per record: the list is built completely
//! before the caller ever applies it, so a missing field can never leave
//! a half-written record in the registry.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::duration::normalize_duration;
use crate::error::{ExporterError, Result};
use crate::shape::{classify, MetricShape};

/// The value carried by one metric update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Last-set numeric sample.
    Gauge(f64),
    /// Textual identity fields for an info metric.
    Info(BTreeMap<String, String>),
}

/// One instruction for the metric sink: which series, which label
/// values (ordered per the catalog's label schema), and the new value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    pub metric: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: UpdateValue,
}

impl MetricUpdate {
    fn gauge(metric: &'static str, labels: Vec<(&'static str, String)>, value: f64) -> Self {
        Self { metric, labels, value: UpdateValue::Gauge(value) }
    }

    fn info(
        metric: &'static str,
        labels: Vec<(&'static str, String)>,
        fields: &[(&str, &str)],
    ) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { metric, labels, value: UpdateValue::Info(fields) }
    }
}

/// Map one record into its ordered list of metric updates.
///
/// Fails with `UnrecognizedShape` when no discriminator matches and with
/// `MissingField` when the matched shape requires a field the record
/// lacks (or carries with the wrong type). Pure: the record is never
/// mutated.
pub fn map_record(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = classify(record).ok_or(ExporterError::UnrecognizedShape)?;
    match shape {
        MetricShape::Rebuild => map_rebuild(record),
        MetricShape::CpuLoad => map_cpu_load(record),
        MetricShape::Memory => map_memory(record),
        MetricShape::Process => map_process(record),
        MetricShape::Disk => map_disk(record),
        MetricShape::Ingest => map_ingest(record),
        MetricShape::Operator => map_operator(record),
    }
}

fn map_rebuild(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Rebuild;
    Ok(vec![
        MetricUpdate::gauge("tenzir_rebuild_partitions", vec![], number(record, shape, "partitions")?),
        MetricUpdate::gauge(
            "tenzir_rebuild_queued_partitions",
            vec![],
            number(record, shape, "queued_partitions")?,
        ),
    ])
}

fn map_cpu_load(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::CpuLoad;
    Ok(vec![
        MetricUpdate::gauge("tenzir_loadavg_1m", vec![], number(record, shape, "loadavg_1m")?),
        MetricUpdate::gauge("tenzir_loadavg_5m", vec![], number(record, shape, "loadavg_5m")?),
        MetricUpdate::gauge("tenzir_loadavg_15m", vec![], number(record, shape, "loadavg_15m")?),
    ])
}

fn map_memory(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Memory;
    Ok(vec![
        MetricUpdate::gauge("tenzir_memory_total_bytes", vec![], number(record, shape, "total_bytes")?),
        MetricUpdate::gauge("tenzir_memory_used_bytes", vec![], number(record, shape, "used_bytes")?),
        MetricUpdate::gauge("tenzir_memory_free_bytes", vec![], number(record, shape, "free_bytes")?),
    ])
}

fn map_process(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Process;
    Ok(vec![
        MetricUpdate::gauge("tenzir_swap_space_usage", vec![], number(record, shape, "swap_space_usage")?),
        MetricUpdate::gauge("tenzir_open_fds", vec![], number(record, shape, "open_fds")?),
        MetricUpdate::gauge(
            "tenzir_current_memory_usage",
            vec![],
            number(record, shape, "current_memory_usage")?,
        ),
        MetricUpdate::gauge(
            "tenzir_peak_memory_usage",
            vec![],
            number(record, shape, "peak_memory_usage")?,
        ),
    ])
}

fn map_disk(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Disk;
    let path = text(record, shape, "path")?;
    let labels = |path: &str| vec![("path", path.to_string())];
    Ok(vec![
        MetricUpdate::gauge("tenzir_disk_total_bytes", labels(&path), number(record, shape, "total_bytes")?),
        MetricUpdate::gauge("tenzir_disk_used_bytes", labels(&path), number(record, shape, "used_bytes")?),
        MetricUpdate::gauge("tenzir_disk_free_bytes", labels(&path), number(record, shape, "free_bytes")?),
    ])
}

fn map_ingest(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Ingest;
    let schema = text(record, shape, "schema")?;
    let schema_id = text(record, shape, "schema_id")?;
    Ok(vec![
        MetricUpdate::info("tenzir_ingest_schema", vec![], &[("schema", &schema)]),
        MetricUpdate::info("tenzir_ingest_schema_id", vec![], &[("schema_id", &schema_id)]),
        MetricUpdate::gauge("tenzir_ingest_events", vec![], number(record, shape, "events")?),
    ])
}

/// The operator shape is the wide one: a run counter, six normalized
/// durations, and per-direction throughput with a unit label.
fn map_operator(record: &Map<String, Value>) -> Result<Vec<MetricUpdate>> {
    let shape = MetricShape::Operator;
    let pipeline_id = text(record, shape, "pipeline_id")?;
    let pid = |extra: Option<&str>| {
        let mut labels = vec![("pipeline_id", pipeline_id.clone())];
        if let Some(unit) = extra {
            labels.push(("unit", unit.to_string()));
        }
        labels
    };

    let input = section(record, shape, "input")?;
    let output = section(record, shape, "output")?;
    let input_unit = text_in(input, shape, "input.unit")?;
    let output_unit = text_in(output, shape, "output.unit")?;

    Ok(vec![
        MetricUpdate::gauge("tenzir_operator_run", pid(None), number(record, shape, "run")?),
        MetricUpdate::gauge("tenzir_operator_duration", pid(None), duration(record, shape, "duration")?),
        MetricUpdate::gauge(
            "tenzir_operator_starting_duration",
            pid(None),
            duration(record, shape, "starting_duration")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_processing_duration",
            pid(None),
            duration(record, shape, "processing_duration")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_scheduled_duration",
            pid(None),
            duration(record, shape, "scheduled_duration")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_running_duration",
            pid(None),
            duration(record, shape, "running_duration")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_paused_duration",
            pid(None),
            duration(record, shape, "paused_duration")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_input_elements",
            pid(Some(&input_unit)),
            number_in(input, shape, "input.elements")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_output_elements",
            pid(Some(&output_unit)),
            number_in(output, shape, "output.elements")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_input_bytes",
            pid(Some(&input_unit)),
            number_in(input, shape, "input.approx_bytes")?,
        ),
        MetricUpdate::gauge(
            "tenzir_operator_output_bytes",
            pid(Some(&output_unit)),
            number_in(output, shape, "output.approx_bytes")?,
        ),
        MetricUpdate::info("tenzir_operator_input_unit", pid(None), &[("unit", &input_unit)]),
        MetricUpdate::info("tenzir_operator_output_unit", pid(None), &[("unit", &output_unit)]),
        MetricUpdate::info("tenzir_operator_pipeline_id", vec![], &[("pipeline_id", &pipeline_id)]),
    ])
}

fn missing(shape: MetricShape, field: &'static str) -> ExporterError {
    ExporterError::MissingField { shape: shape.name(), field }
}

fn number(record: &Map<String, Value>, shape: MetricShape, field: &'static str) -> Result<f64> {
    record
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(shape, field))
}

fn text(record: &Map<String, Value>, shape: MetricShape, field: &'static str) -> Result<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(shape, field))
}

/// A duration field may already be numeric or carry a unit suffix.
fn duration(record: &Map<String, Value>, shape: MetricShape, field: &'static str) -> Result<f64> {
    match record.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| missing(shape, field)),
        Some(Value::String(token)) => normalize_duration(token).ok_or_else(|| missing(shape, field)),
        _ => Err(missing(shape, field)),
    }
}

fn section<'a>(
    record: &'a Map<String, Value>,
    shape: MetricShape,
    field: &'static str,
) -> Result<&'a Map<String, Value>> {
    record
        .get(field)
        .and_then(Value::as_object)
        .ok_or_else(|| missing(shape, field))
}

fn number_in(section: &Map<String, Value>, shape: MetricShape, field: &'static str) -> Result<f64> {
    let key = field.rsplit('.').next().unwrap_or(field);
    section
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(shape, field))
}

fn text_in(section: &Map<String, Value>, shape: MetricShape, field: &'static str) -> Result<String> {
    let key = field.rsplit('.').next().unwrap_or(field);
    section
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(shape, field))
}
