//! Downstream calls.
//!
//! One call is one `GET http://<address>/` carrying the propagated trace
//! context. Only the status code matters; the body is drained and discarded.

use async_trait::async_trait;
use http::HeaderMap;
use tracing::{debug, warn};

use tracehop_config::ClientConfig;
use tracehop_telemetry::MetricsRecorder;

use crate::outcome::CallOutcome;
use crate::propagation::{TraceContext, TracePropagator};

/// Issues a single call to a single peer.
///
/// Implementations never fail the caller: every way a call can go wrong is
/// folded into the returned [`CallOutcome`].
#[async_trait]
pub trait DownstreamCaller: Send + Sync {
    async fn call_one(&self, address: &str, context: &TraceContext) -> CallOutcome;
}

pub fn peer_url(address: &str) -> String {
    format!("http://{}/", address)
}

/// `reqwest`-backed caller shared by every request and fan-out branch.
#[derive(Debug, Clone)]
pub struct HttpCaller {
    client: reqwest::Client,
    propagator: TracePropagator,
    metrics: Option<MetricsRecorder>,
}

impl HttpCaller {
    pub fn new(config: &ClientConfig, propagator: TracePropagator) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            propagator,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl DownstreamCaller for HttpCaller {
    async fn call_one(&self, address: &str, context: &TraceContext) -> CallOutcome {
        let mut headers = HeaderMap::new();
        self.propagator.inject(context, &mut headers);

        let outcome = match self
            .client
            .get(peer_url(address))
            .headers(headers)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                // Drain so the connection goes back to the pool.
                if let Err(error) = response.bytes().await {
                    debug!(peer = address, %error, "Failed to drain response body");
                }
                CallOutcome::from_status(status)
            }
            Err(error) => CallOutcome::TransportError {
                reason: error.to_string(),
            },
        };

        match &outcome {
            CallOutcome::Success { status } => {
                debug!(peer = address, status = status.as_u16(), "Downstream call succeeded")
            }
            CallOutcome::Failure { status } => {
                warn!(peer = address, status = status.as_u16(), "Downstream call failed")
            }
            CallOutcome::TransportError { reason } => {
                warn!(peer = address, %reason, "Downstream call did not complete")
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_call(outcome.label());
        }

        outcome
    }
}
