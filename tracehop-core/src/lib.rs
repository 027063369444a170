//! # tracehop-core
//!
//! The fan-out engine of a tracehop node.
//!
//! A request first goes through the [`WorkloadSimulator`], which sleeps for the
//! configured latency and then fails with the configured probability. If it
//! survives, the [`FanOut`] orchestrator calls every configured peer through a
//! [`DownstreamCaller`], injecting the caller's [`TraceContext`] into each
//! outbound request, and folds the individual [`CallOutcome`]s into one
//! [`AggregateOutcome`].
//!
//! ### Key Submodules:
//! - `workload`: latency and failure injection
//! - `propagation`: trace-context extraction and injection over HTTP headers
//! - `caller`: one outbound call, classified by status code
//! - `fanout`: sequential (short-circuit) and parallel (barrier) execution

pub mod caller;
pub mod error;
pub mod fanout;
pub mod outcome;
pub mod propagation;
pub mod workload;

pub mod prelude {
    pub use crate::caller::{DownstreamCaller, HttpCaller};
    pub use crate::error::SimulatedError;
    pub use crate::fanout::FanOut;
    pub use crate::outcome::{AggregateOutcome, CallOutcome};
    pub use crate::propagation::{TraceContext, TracePropagator};
    pub use crate::workload::WorkloadSimulator;
}

pub use caller::{DownstreamCaller, HttpCaller};
pub use error::SimulatedError;
pub use fanout::FanOut;
pub use outcome::{AggregateOutcome, CallOutcome};
pub use propagation::{TraceContext, TracePropagator};
pub use workload::WorkloadSimulator;
