//! # tracehop-engine
//!
//! The HTTP node around the fan-out engine: request handling, routing, and
//! the listener lifecycle. Frontends (the CLI, tests) only need [`run_node`]
//! or [`Node`].

pub mod error;
pub mod handler;
pub mod runtime;
pub mod state;

pub use error::NodeError;
pub use handler::{handle_request, router};
pub use runtime::{run_node, shutdown_signal, Node};
pub use state::NodeState;
