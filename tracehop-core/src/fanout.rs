//! Fan-out orchestration.
//!
//! Sequential mode calls peers in list order and stops at the first failure;
//! peers after it are never called. Parallel mode calls every peer at once and
//! waits for all of them before reducing, even if some have already failed.
//! Every branch finishes (or is aborted, if the request future is dropped)
//! before `run` returns.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, warn, Instrument};

use tracehop_config::{ExecutionMode, FanOutConfig, TargetList};

use crate::caller::DownstreamCaller;
use crate::outcome::AggregateOutcome;
use crate::propagation::TraceContext;

/// Drives a [`DownstreamCaller`] over the configured peers.
#[derive(Clone)]
pub struct FanOut {
    caller: Arc<dyn DownstreamCaller>,
    targets: TargetList,
    mode: ExecutionMode,
}

impl FanOut {
    pub fn new(caller: Arc<dyn DownstreamCaller>, config: FanOutConfig) -> Self {
        Self {
            caller,
            targets: config.targets,
            mode: config.mode,
        }
    }

    pub fn targets(&self) -> &TargetList {
        &self.targets
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub async fn run(&self, context: &TraceContext) -> AggregateOutcome {
        if self.targets.is_empty() {
            return AggregateOutcome::Success;
        }

        let started = Instant::now();
        let outcome = match self.mode {
            ExecutionMode::Sequential => self.run_sequential(context).await,
            ExecutionMode::Parallel => self.run_parallel(context).await,
        };
        debug!(
            mode = %self.mode,
            targets = self.targets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?outcome,
            "Fan-out complete"
        );
        outcome
    }

    async fn run_sequential(&self, context: &TraceContext) -> AggregateOutcome {
        for (index, address) in self.targets.iter().enumerate() {
            let outcome = self.caller.call_one(address, context).await;
            if !outcome.is_success() {
                let skipped = self.targets.len() - index - 1;
                debug!(peer = %address, skipped, "Stopping fan-out at first failure");
                return AggregateOutcome::Failure { failed: 1 };
            }
        }
        AggregateOutcome::Success
    }

    async fn run_parallel(&self, context: &TraceContext) -> AggregateOutcome {
        let mut branches = JoinSet::new();
        for address in self.targets.iter().cloned() {
            let caller = Arc::clone(&self.caller);
            let context = context.clone();
            branches.spawn(
                async move { caller.call_one(&address, &context).await }.in_current_span(),
            );
        }

        // Single reducer: branches only report, never touch shared state.
        let mut failed = 0;
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(outcome) if outcome.is_success() => {}
                Ok(_) => failed += 1,
                Err(error) => {
                    warn!(%error, "Fan-out branch did not finish");
                    failed += 1;
                }
            }
        }
        AggregateOutcome::from_failures(failed)
    }
}
