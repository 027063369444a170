//! Synthetic workload configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Parameters of the simulated local processing step.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time spent "processing" every request, in milliseconds.
    pub latency_ms: u64,

    /// Percentage of requests that fail locally (0 never fails, 100 always fails).
    #[validate(range(max = 100, message = "error rate must be between 0 and 100"))]
    pub error_rate_percent: u8,
}

impl SimulationConfig {
    /// Processing latency as a `Duration`.
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_ms: 100,
            error_rate_percent: 0,
        }
    }
}
