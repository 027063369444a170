use thiserror::Error;

/// Failure injected by the workload simulator.
///
/// Never fatal: the request handler maps it to a 5xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulated failure (draw {draw} < error rate {rate_percent}%)")]
pub struct SimulatedError {
    pub draw: u8,
    pub rate_percent: u8,
}
