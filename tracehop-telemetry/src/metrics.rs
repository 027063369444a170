//! Prometheus metrics for request handling and downstream calls.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label for `tracehop_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Ok,
    SimulatedError,
    DownstreamFailure,
}

impl RequestOutcome {
    fn label(self) -> &'static str {
        match self {
            RequestOutcome::Ok => "ok",
            RequestOutcome::SimulatedError => "simulated_error",
            RequestOutcome::DownstreamFailure => "downstream_failure",
        }
    }
}

/// Outcome label for `tracehop_downstream_calls_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLabel {
    Success,
    Failure,
    TransportError,
}

impl CallLabel {
    fn label(self) -> &'static str {
        match self {
            CallLabel::Success => "success",
            CallLabel::Failure => "failure",
            CallLabel::TransportError => "transport_error",
        }
    }
}

/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub requests: IntCounterVec,
    pub downstream_calls: IntCounterVec,
    pub fan_out_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("tracehop_requests_total", "Inbound requests by outcome"),
            &["outcome"],
        )?;
        let downstream_calls = IntCounterVec::new(
            Opts::new(
                "tracehop_downstream_calls_total",
                "Calls made to downstream peers by outcome",
            ),
            &["outcome"],
        )?;
        let fan_out_duration = Histogram::with_opts(
            HistogramOpts::new(
                "tracehop_fan_out_duration_seconds",
                "Wall time spent calling downstream peers for one request",
            )
            .buckets(vec![0.001, 0.005, 0.025, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(downstream_calls.clone()))?;
        registry.register(Box::new(fan_out_duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            downstream_calls,
            fan_out_duration,
        })
    }

    pub fn record_request(&self, outcome: RequestOutcome) {
        self.requests.with_label_values(&[outcome.label()]).inc();
    }

    pub fn record_call(&self, outcome: CallLabel) {
        self.downstream_calls
            .with_label_values(&[outcome.label()])
            .inc();
    }

    pub fn observe_fan_out(&self, seconds: f64) {
        self.fan_out_duration.observe(seconds);
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_with_labels() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.record_request(RequestOutcome::Ok);
        metrics.record_request(RequestOutcome::SimulatedError);
        metrics.record_call(CallLabel::TransportError);
        metrics.observe_fan_out(0.01);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains(r#"tracehop_requests_total{outcome="ok"} 1"#));
        assert!(text.contains(r#"tracehop_requests_total{outcome="simulated_error"} 1"#));
        assert!(text.contains(r#"tracehop_downstream_calls_total{outcome="transport_error"} 1"#));
        assert!(text.contains("tracehop_fan_out_duration_seconds_count 1"));
    }

    #[test]
    fn clones_share_registry() {
        let metrics = MetricsRecorder::new().unwrap();
        let clone = metrics.clone();
        clone.record_call(CallLabel::Success);
        assert_eq!(
            metrics
                .downstream_calls
                .with_label_values(&["success"])
                .get(),
            1
        );
    }
}
