//! Tenzir telemetry exporter.
//!
//! Accepts POSTed batches of concatenated Tenzir metric records, repairs
//! and splits them, classifies each record into one of seven shapes,
//! normalizes duration tokens, applies the resulting updates to an owned
//! gauge/info registry and pushes the snapshot to a Prometheus
//! Pushgateway once per batch.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod duration;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod push;
pub mod registry;
pub mod server;
pub mod shape;
pub mod telemetry;

pub use error::{ExporterError, Result};
