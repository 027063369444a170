//! Logging and span export configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Output format of the log subscriber.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// Multi-line human readable output.
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

/// Where finished server spans are sent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceExporter {
    /// Spans are created and propagated but not exported.
    #[default]
    None,
    /// Finished spans are printed to stdout.
    Stdout,
    /// Spans are batched to an OTLP/gRPC collector at `otlp_endpoint`.
    Otlp,
}

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter level; `RUST_LOG` takes precedence when set.
    #[validate(custom(function = validation::validate_log_level))]
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Span exporter.
    pub trace_exporter: TraceExporter,

    /// Collector endpoint, only read when `trace_exporter` is `otlp`.
    #[validate(custom(function = validation::validate_endpoint))]
    pub otlp_endpoint: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_format: LogFormat::default(),
            trace_exporter: TraceExporter::default(),
            otlp_endpoint: "http://localhost:4317".into(),
        }
    }
}
