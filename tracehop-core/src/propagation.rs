//! Trace-context propagation over HTTP headers.
//!
//! The wire format belongs to the configured [`TextMapPropagator`]; this module
//! only adapts `http::HeaderMap` to the propagator's carrier traits and keeps
//! the extracted context for the lifetime of one inbound request.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use opentelemetry::propagation::{
    Extractor, Injector, TextMapCompositePropagator, TextMapPropagator,
};
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Trace context of one inbound request.
///
/// Read-only once extracted. Cloning is cheap and shares the same context.
#[derive(Clone, Default)]
pub struct TraceContext {
    inner: Context,
}

impl TraceContext {
    /// A context with no parent span; downstream calls go out unheadered.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn extract(propagator: &TracePropagator, headers: &HeaderMap) -> Self {
        Self {
            inner: propagator
                .inner
                .extract_with_context(&Context::new(), &HeaderExtractor(headers)),
        }
    }

    pub fn from_context(inner: Context) -> Self {
        Self { inner }
    }

    /// Whether a valid parent span was found on the inbound request.
    pub fn is_present(&self) -> bool {
        self.inner.span().span_context().is_valid()
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.is_present()
            .then(|| self.inner.span().span_context().trace_id())
    }

    pub fn as_context(&self) -> &Context {
        &self.inner
    }
}

impl fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceContext")
            .field("trace_id", &self.trace_id())
            .finish()
    }
}

/// Encodes and decodes trace contexts using a shared propagator.
#[derive(Clone)]
pub struct TracePropagator {
    inner: Arc<dyn TextMapPropagator + Send + Sync>,
}

impl TracePropagator {
    pub fn new(inner: Arc<dyn TextMapPropagator + Send + Sync>) -> Self {
        Self { inner }
    }

    /// W3C `traceparent`/`tracestate` plus W3C `baggage`.
    pub fn w3c() -> Self {
        Self::new(Arc::new(TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ])))
    }

    /// Writes `context` into `headers`. Each field is written only when the
    /// context carries it: no span means no `traceparent`, no baggage means no
    /// `baggage`, and an empty context leaves the headers untouched.
    pub fn inject(&self, context: &TraceContext, headers: &mut HeaderMap) {
        self.inner
            .inject_context(context.as_context(), &mut HeaderInjector(headers));
    }
}

impl Default for TracePropagator {
    fn default() -> Self {
        Self::w3c()
    }
}

impl fmt::Debug for TracePropagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracePropagator")
            .field("fields", &self.inner.fields().collect::<Vec<_>>())
            .finish()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        // Keys and values that are not valid header text are dropped.
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}
