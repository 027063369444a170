//! Outbound HTTP client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Settings for calls made to downstream peers.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on a single downstream call, in milliseconds.
    ///
    /// Unset means calls are unbounded and a hanging peer stalls the whole fan-out.
    #[validate(range(min = 1))]
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
