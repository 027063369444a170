//! Request handling: simulate local work, then fan out.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{error, field, info_span, warn, Instrument};

use tracehop_core::{AggregateOutcome, TraceContext};
use tracehop_telemetry::{NodeTracer, RequestOutcome};

use crate::state::NodeState;

/// Routes served by a node.
pub fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Runs one request through the simulator and, if it survives, the fan-out.
///
/// Every per-request failure ends up as a status code; nothing here can take
/// the process down.
pub async fn handle_request(state: &NodeState, context: &TraceContext) -> StatusCode {
    if let Err(error) = state.simulator.simulate().await {
        warn!(%error, "Local processing failed");
        state.metrics.record_request(RequestOutcome::SimulatedError);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let started = Instant::now();
    let outcome = state.fan_out.run(context).await;
    if !state.fan_out.targets().is_empty() {
        state
            .metrics
            .observe_fan_out(started.elapsed().as_secs_f64());
    }

    match outcome {
        AggregateOutcome::Success => {
            state.metrics.record_request(RequestOutcome::Ok);
            StatusCode::NO_CONTENT
        }
        AggregateOutcome::Failure { failed } => {
            warn!(failed, mode = %state.fan_out.mode(), "Downstream fan-out failed");
            state.metrics.record_request(RequestOutcome::DownstreamFailure);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Opens this hop's server span under the inbound context, so downstream
/// calls carry the node's own span id. An untraced request starts a new trace.
async fn root(State(state): State<Arc<NodeState>>, headers: HeaderMap) -> StatusCode {
    let inbound = TraceContext::extract(&state.propagator, &headers);
    let context =
        TraceContext::from_context(state.tracer.start_server_span(inbound.as_context(), "/"));

    let span = info_span!("request", trace_id = field::Empty, parent = inbound.is_present());
    if let Some(trace_id) = context.trace_id() {
        span.record("trace_id", field::display(trace_id));
    }

    let status = handle_request(&state, &context).instrument(span).await;
    NodeTracer::end_server_span(context.as_context(), status.as_u16());
    status
}

async fn metrics(State(state): State<Arc<NodeState>>) -> Response {
    match state.metrics.gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(error) => {
            error!(%error, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use tracehop_config::{ExecutionMode, FanOutConfig, SimulationConfig, TargetList};
    use tracehop_core::{CallOutcome, DownstreamCaller, FanOut, TracePropagator, WorkloadSimulator};
    use tracehop_telemetry::MetricsRecorder;

    use super::*;

    #[derive(Default)]
    struct CountingCaller {
        status: Option<StatusCode>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl DownstreamCaller for CountingCaller {
        async fn call_one(&self, _address: &str, _context: &TraceContext) -> CallOutcome {
            *self.calls.lock() += 1;
            CallOutcome::from_status(self.status.unwrap_or(StatusCode::NO_CONTENT))
        }
    }

    fn state(error_rate_percent: u8, caller: Arc<CountingCaller>, targets: &[&str]) -> NodeState {
        NodeState::new(
            WorkloadSimulator::new(SimulationConfig {
                latency_ms: 0,
                error_rate_percent,
            }),
            FanOut::new(
                caller,
                FanOutConfig {
                    targets: TargetList::new(targets.iter().copied()),
                    mode: ExecutionMode::Sequential,
                },
            ),
            TracePropagator::w3c(),
            NodeTracer::default(),
            MetricsRecorder::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn no_targets_is_no_content() {
        let caller = Arc::new(CountingCaller::default());
        let state = state(0, caller.clone(), &[]);
        assert_eq!(
            handle_request(&state, &TraceContext::empty()).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(*caller.calls.lock(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn local_failure_skips_fan_out() {
        let caller = Arc::new(CountingCaller::default());
        let state = state(100, caller.clone(), &["a:1"]);
        assert_eq!(
            handle_request(&state, &TraceContext::empty()).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(*caller.calls.lock(), 0);
        assert!(logs_contain("Local processing failed"));
        assert_eq!(
            state
                .metrics
                .requests
                .with_label_values(&["simulated_error"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn downstream_failure_is_server_error() {
        let caller = Arc::new(CountingCaller {
            status: Some(StatusCode::SERVICE_UNAVAILABLE),
            ..Default::default()
        });
        let state = state(0, caller.clone(), &["a:1", "b:2"]);
        assert_eq!(
            handle_request(&state, &TraceContext::empty()).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(*caller.calls.lock(), 1);
        assert_eq!(
            state
                .metrics
                .requests
                .with_label_values(&["downstream_failure"])
                .get(),
            1
        );
    }
}
