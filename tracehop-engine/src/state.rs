//! Process-wide, read-only state shared by every request.

use std::sync::Arc;

use tracehop_config::NodeConfig;
use tracehop_core::{FanOut, HttpCaller, TracePropagator, WorkloadSimulator};
use tracehop_telemetry::{MetricsRecorder, NodeTracer};

use crate::error::NodeError;

/// Built once at startup; requests only read from it, so no locking is needed.
pub struct NodeState {
    pub simulator: WorkloadSimulator,
    pub fan_out: FanOut,
    pub propagator: TracePropagator,
    pub tracer: NodeTracer,
    pub metrics: MetricsRecorder,
}

impl NodeState {
    pub fn new(
        simulator: WorkloadSimulator,
        fan_out: FanOut,
        propagator: TracePropagator,
        tracer: NodeTracer,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            simulator,
            fan_out,
            propagator,
            tracer,
            metrics,
        }
    }

    /// Wires the HTTP caller, simulator, orchestrator and tracer from configuration.
    pub fn from_config(config: &NodeConfig, metrics: MetricsRecorder) -> Result<Self, NodeError> {
        let propagator = TracePropagator::w3c();
        let tracer =
            NodeTracer::new(&config.server, &config.telemetry).map_err(NodeError::Tracer)?;
        let caller = HttpCaller::new(&config.client, propagator.clone())?
            .with_metrics(metrics.clone());

        Ok(Self::new(
            WorkloadSimulator::new(config.simulation.clone()),
            FanOut::new(Arc::new(caller), config.fanout.clone()),
            propagator,
            tracer,
            metrics,
        ))
    }
}
