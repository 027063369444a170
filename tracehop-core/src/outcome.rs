//! Per-call and per-request outcomes.

use http::StatusCode;

use tracehop_telemetry::CallLabel;

/// Result of one downstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The peer answered with a non-5xx status.
    Success { status: StatusCode },
    /// The peer answered with a 5xx status.
    Failure { status: StatusCode },
    /// The call never produced a response (refused, reset, timed out, ...).
    TransportError { reason: String },
}

impl CallOutcome {
    /// Classifies a completed response: anything at or above 500 is a failure.
    pub fn from_status(status: StatusCode) -> Self {
        if status.as_u16() >= 500 {
            CallOutcome::Failure { status }
        } else {
            CallOutcome::Success { status }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }

    pub fn label(&self) -> CallLabel {
        match self {
            CallOutcome::Success { .. } => CallLabel::Success,
            CallOutcome::Failure { .. } => CallLabel::Failure,
            CallOutcome::TransportError { .. } => CallLabel::TransportError,
        }
    }
}

/// Reduction of every call made for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOutcome {
    Success,
    /// At least one call failed. `failed` counts the failures observed before
    /// the fan-out stopped.
    Failure { failed: usize },
}

impl AggregateOutcome {
    /// Logical OR of failures; order does not matter.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a CallOutcome>,
    {
        Self::from_failures(outcomes.into_iter().filter(|o| !o.is_success()).count())
    }

    pub fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            AggregateOutcome::Success
        } else {
            AggregateOutcome::Failure { failed }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AggregateOutcome::Success)
    }
}
