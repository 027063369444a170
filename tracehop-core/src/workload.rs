//! Synthetic workload: a fixed processing delay followed by a weighted coin flip.

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

use tracehop_config::SimulationConfig;

use crate::error::SimulatedError;

/// Number of buckets the failure draw is taken from.
const DRAW_SPACE: u8 = 100;

#[derive(Debug, Clone)]
pub struct WorkloadSimulator {
    config: SimulationConfig,
}

impl WorkloadSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Sleeps for the configured latency, then fails with the configured probability.
    ///
    /// The draw comes from the thread-local, OS-seeded generator so that
    /// outcomes differ between requests.
    pub async fn simulate(&self) -> Result<(), SimulatedError> {
        sleep(self.config.latency()).await;

        let draw = rand::rng().random_range(0..DRAW_SPACE);
        self.judge(draw)
    }

    /// Decides the outcome for a given draw in `0..100`.
    pub fn judge(&self, draw: u8) -> Result<(), SimulatedError> {
        let rate_percent = self.config.error_rate_percent;
        if draw < rate_percent {
            debug!(draw, rate_percent, "Injecting simulated failure");
            Err(SimulatedError { draw, rate_percent })
        } else {
            Ok(())
        }
    }
}
