//! Server spans and their export.
//!
//! Every inbound request gets one `SpanKind::Server` span. Its parent is
//! whatever context arrived on the wire; without one the span starts a new
//! trace. The span's context is what the node propagates downstream, so each
//! hop shows up as its own node in the trace tree.

use std::fmt;

use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing::{debug, warn};

use tracehop_config::{ServerConfig, TelemetryConfig, TraceExporter};

use crate::logging::InitError;

const INSTRUMENTATION_SCOPE: &str = "tracehop";

/// Owns the node's tracer provider. Clones share the same provider.
#[derive(Clone)]
pub struct NodeTracer {
    provider: TracerProvider,
    tracer: Tracer,
}

impl NodeTracer {
    /// Builds a provider for the configured exporter.
    ///
    /// The OTLP exporter batches on the Tokio runtime, so it must be built
    /// from inside one.
    pub fn new(server: &ServerConfig, config: &TelemetryConfig) -> Result<Self, InitError> {
        let builder = TracerProvider::builder().with_resource(Resource::new(vec![
            KeyValue::new("service.name", server.app_name.clone()),
            KeyValue::new("deployment.environment", server.environment.clone()),
        ]));

        let provider = match config.trace_exporter {
            TraceExporter::None => builder.build(),
            TraceExporter::Stdout => builder
                .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
                .build(),
            TraceExporter::Otlp => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.otlp_endpoint.clone())
                    .build()?;
                builder.with_batch_exporter(exporter, runtime::Tokio).build()
            }
        };

        debug!(exporter = ?config.trace_exporter, "Tracer provider ready");
        Ok(Self::from_provider(provider))
    }

    pub fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(INSTRUMENTATION_SCOPE);
        Self { provider, tracer }
    }

    /// Starts the server span of one request as a child of `parent`.
    ///
    /// The returned context keeps `parent`'s baggage.
    pub fn start_server_span(&self, parent: &Context, route: &'static str) -> Context {
        let span = self
            .tracer
            .span_builder(format!("GET {}", route))
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new("http.request.method", "GET"),
                KeyValue::new("http.route", route),
            ])
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    /// Records the response status on the active span of `context` and ends it.
    pub fn end_server_span(context: &Context, status: u16) {
        let span = context.span();
        span.set_attribute(KeyValue::new(
            "http.response.status_code",
            i64::from(status),
        ));
        if status >= 500 {
            span.set_status(Status::error(format!("responded {}", status)));
        }
        span.end();
    }

    /// Flushes and stops the exporter. Spans ended afterwards are dropped.
    ///
    /// Blocks until pending batches are handed off.
    pub fn shutdown(&self) {
        if let Err(error) = self.provider.shutdown() {
            warn!(%error, "Failed to flush spans");
        }
    }
}

impl Default for NodeTracer {
    /// Creates and propagates spans without exporting them.
    fn default() -> Self {
        Self::from_provider(TracerProvider::builder().build())
    }
}

impl fmt::Debug for NodeTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTracer")
            .field("scope", &INSTRUMENTATION_SCOPE)
            .finish_non_exhaustive()
    }
}
