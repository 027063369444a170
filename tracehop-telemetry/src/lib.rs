//! # Tracehop Telemetry
//!
//! Crate for logging, metrics and spans: local log output, the Prometheus
//! registry scraped from `/metrics`, and the tracer provider that creates one
//! server span per request and exports it (stdout or OTLP) when configured.

pub mod logging;
pub mod metrics;
pub mod tracer;

pub use logging::NodeLogger;
pub use metrics::{CallLabel, MetricsRecorder, RequestOutcome};
pub use tracer::NodeTracer;
