//! The owned metric registry and its exposition rendering.
//!
//! The registry is the sink the mapper's instructions land in. It is a
//! plain value owned by the server state and injected where needed, so
//! the classifier and mapper can be tested against a private instance
//! without any process-wide recorder.

use std::collections::BTreeMap;

use crate::catalog::{self, MetricKind};
use crate::mapper::{MetricUpdate, UpdateValue};

/// Anything that can receive metric update instructions.
pub trait MetricSink {
    fn accept(&mut self, update: MetricUpdate);
}

type SeriesKey = Vec<(&'static str, String)>;

/// Last-write-wins storage for every exported series, keyed by metric
/// name and label values.
#[derive(Debug, Default)]
pub struct TenzirRegistry {
    gauges: BTreeMap<&'static str, BTreeMap<SeriesKey, f64>>,
    infos: BTreeMap<&'static str, BTreeMap<SeriesKey, BTreeMap<String, String>>>,
}

impl TenzirRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of live series across all metrics.
    pub fn series_count(&self) -> usize {
        self.gauges.values().map(BTreeMap::len).sum::<usize>()
            + self.infos.values().map(BTreeMap::len).sum::<usize>()
    }

    /// Read back a gauge value, mainly for tests and diagnostics.
    pub fn gauge_value(&self, metric: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges.get(metric)?.iter().find_map(|(key, value)| {
            let matches = key.len() == labels.len()
                && key.iter().zip(labels).all(|((kn, kv), (ln, lv))| kn == ln && kv == lv);
            matches.then_some(*value)
        })
    }

    /// Render the current snapshot in the Prometheus text format.
    ///
    /// Gauges render as `name{labels} value`; info metrics follow the
    /// client-library convention of `name_info{labels,fields} 1`. HELP
    /// and TYPE headers come from the catalog.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for (name, series) in &self.gauges {
            if let Some(desc) = catalog::describe(name) {
                out.push_str(&format!("# HELP {} {}\n", name, desc.help));
                out.push_str(&format!("# TYPE {} gauge\n", name));
            }
            for (labels, value) in series {
                out.push_str(name);
                render_labels(&mut out, labels, &BTreeMap::new());
                out.push_str(&format!(" {}\n", format_value(*value)));
            }
        }

        for (name, series) in &self.infos {
            if let Some(desc) = catalog::describe(name) {
                out.push_str(&format!("# HELP {}_info {}\n", name, desc.help));
                out.push_str(&format!("# TYPE {}_info gauge\n", name));
            }
            for (labels, fields) in series {
                out.push_str(name);
                out.push_str("_info");
                render_labels(&mut out, labels, fields);
                out.push_str(" 1\n");
            }
        }

        out
    }
}

impl MetricSink for TenzirRegistry {
    fn accept(&mut self, update: MetricUpdate) {
        let expected = match update.value {
            UpdateValue::Gauge(_) => MetricKind::Gauge,
            UpdateValue::Info(_) => MetricKind::Info,
        };
        debug_assert_eq!(
            catalog::describe(update.metric).map(|d| d.kind),
            Some(expected),
            "update kind disagrees with catalog for {}",
            update.metric
        );
        match update.value {
            UpdateValue::Gauge(value) => {
                self.gauges
                    .entry(update.metric)
                    .or_default()
                    .insert(update.labels, value);
            }
            UpdateValue::Info(fields) => {
                self.infos
                    .entry(update.metric)
                    .or_default()
                    .insert(update.labels, fields);
            }
        }
    }
}

fn render_labels(out: &mut String, labels: &SeriesKey, fields: &BTreeMap<String, String>) {
    if labels.is_empty() && fields.is_empty() {
        return;
    }
    out.push('{');
    let mut first = true;
    for (name, value) in labels.iter().map(|(n, v)| (*n, v.as_str())).chain(
        fields.iter().map(|(n, v)| (n.as_str(), v.as_str())),
    ) {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&format!("{}=\"{}\"", name, escape_label_value(value)));
    }
    out.push('}');
}

/// Escape per the exposition format: backslash, quote, newline.
fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Integral values render without a trailing `.0`, matching what the
/// gateway stores for byte counts.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_record;
    use serde_json::json;

    fn apply(registry: &mut TenzirRegistry, value: serde_json::Value) {
        let serde_json::Value::Object(record) = value else {
            panic!("test record must be an object");
        };
        for update in map_record(&record).unwrap() {
            registry.accept(update);
        }
    }

    #[test]
    fn stores_and_renders_unlabeled_gauges() {
        let mut registry = TenzirRegistry::new();
        apply(&mut registry, json!({"total_bytes": 100, "used_bytes": 40, "free_bytes": 60}));

        assert_eq!(registry.gauge_value("tenzir_memory_total_bytes", &[]), Some(100.0));
        let text = registry.render();
        assert!(text.contains("# TYPE tenzir_memory_total_bytes gauge"));
        assert!(text.contains("tenzir_memory_total_bytes 100\n"));
    }

    #[test]
    fn last_write_wins_per_series() {
        let mut registry = TenzirRegistry::new();
        apply(&mut registry, json!({"loadavg_1m": 0.5, "loadavg_5m": 0.4, "loadavg_15m": 0.3}));
        apply(&mut registry, json!({"loadavg_1m": 0.9, "loadavg_5m": 0.4, "loadavg_15m": 0.3}));

        assert_eq!(registry.gauge_value("tenzir_loadavg_1m", &[]), Some(0.9));
        assert_eq!(registry.series_count(), 3);
    }

    #[test]
    fn disk_series_are_split_by_path_label() {
        let mut registry = TenzirRegistry::new();
        apply(
            &mut registry,
            json!({"path": "/data", "total_bytes": 500, "used_bytes": 200, "free_bytes": 300}),
        );
        apply(
            &mut registry,
            json!({"path": "/tmp", "total_bytes": 50, "used_bytes": 20, "free_bytes": 30}),
        );

        assert_eq!(
            registry.gauge_value("tenzir_disk_total_bytes", &[("path", "/data")]),
            Some(500.0)
        );
        assert_eq!(
            registry.gauge_value("tenzir_disk_total_bytes", &[("path", "/tmp")]),
            Some(50.0)
        );
        let text = registry.render();
        assert!(text.contains("tenzir_disk_total_bytes{path=\"/data\"} 500"));
        assert!(text.contains("tenzir_disk_total_bytes{path=\"/tmp\"} 50"));
    }

    #[test]
    fn info_metrics_render_with_the_info_suffix() {
        let mut registry = TenzirRegistry::new();
        apply(&mut registry, json!({"schema": "suricata.dns", "schema_id": "ab12", "events": 9}));

        let text = registry.render();
        assert!(text.contains("tenzir_ingest_schema_info{schema=\"suricata.dns\"} 1"));
        assert!(text.contains("tenzir_ingest_schema_id_info{schema_id=\"ab12\"} 1"));
        assert!(text.contains("tenzir_ingest_events 9\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        let mut registry = TenzirRegistry::new();
        apply(
            &mut registry,
            json!({"path": "/weird\"mount\\x", "total_bytes": 1, "used_bytes": 1, "free_bytes": 0}),
        );
        let text = registry.render();
        assert!(text.contains(r#"path="/weird\"mount\\x""#));
    }

    #[test]
    fn fractional_gauges_keep_their_fraction() {
        let mut registry = TenzirRegistry::new();
        apply(&mut registry, json!({"loadavg_1m": 0.5, "loadavg_5m": 0.4, "loadavg_15m": 0.3}));
        let text = registry.render();
        assert!(text.contains("tenzir_loadavg_1m 0.5\n"));
    }

    #[test]
    fn empty_registry_renders_empty() {
        assert!(TenzirRegistry::new().render().is_empty());
    }
}
