//! Downstream fan-out configuration.
//!
//! Peers are a static, pre-resolved list. There is no discovery; the list is
//! fixed for the lifetime of the process.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{self, Validate};

use crate::validation;

/// How the node drives calls to its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Call peers one by one in list order, stopping at the first failure.
    #[default]
    Sequential,
    /// Call every peer concurrently and wait for all of them.
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExecutionMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExecutionMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            // `CALL_PARALLEL=true` style flag.
            Flag(bool),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(ExecutionMode::Parallel),
            Repr::Flag(false) => Ok(ExecutionMode::Sequential),
            Repr::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
                "sequential" | "false" => Ok(ExecutionMode::Sequential),
                "parallel" | "true" => Ok(ExecutionMode::Parallel),
                other => Err(serde::de::Error::custom(format!(
                    "unknown execution mode '{}', expected 'sequential' or 'parallel'",
                    other
                ))),
            },
        }
    }
}

/// Ordered list of `host:port` peer addresses.
///
/// Duplicates are kept and called as many times as they appear. An empty list
/// means the node never fans out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList(Vec<String>);

impl TargetList {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(targets.into_iter().map(Into::into).collect())
    }

    /// Parse a comma separated list, dropping empty segments.
    pub fn parse(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|segment| !segment.is_empty()),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Deref for TargetList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for TargetList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TargetList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            List(Vec<String>),
            Joined(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::List(targets) => TargetList::new(
                targets
                    .iter()
                    .map(|target| target.trim())
                    .filter(|target| !target.is_empty()),
            ),
            Repr::Joined(raw) => TargetList::parse(&raw),
        })
    }
}

/// Fan-out configuration.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FanOutConfig {
    /// Peers to call after local processing succeeds.
    #[validate(custom(function = validation::validate_targets))]
    pub targets: TargetList,

    /// Sequential or parallel execution.
    pub mode: ExecutionMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        targets: TargetList,
        mode: ExecutionMode,
    }

    fn holder(yaml: &str) -> Holder {
        serde_yaml::from_str(yaml).expect("deserialize")
    }

    #[test]
    fn parse_drops_empty_segments_and_keeps_order() {
        let list = TargetList::parse(" b:2, ,a:1,b:2,");
        assert_eq!(list.as_slice(), &["b:2", "a:1", "b:2"]);
        assert!(TargetList::parse("").is_empty());
    }

    #[test]
    fn accepts_joined_string_and_sequence() {
        let joined = holder("targets: 'a:1,b:2'\nmode: sequential");
        let listed = holder("targets: ['a:1', 'b:2']\nmode: sequential");
        assert_eq!(joined.targets, listed.targets);
    }

    #[test]
    fn mode_accepts_names_and_flags() {
        assert_eq!(holder("targets: ''\nmode: Parallel").mode, ExecutionMode::Parallel);
        assert_eq!(holder("targets: ''\nmode: true").mode, ExecutionMode::Parallel);
        assert_eq!(holder("targets: ''\nmode: false").mode, ExecutionMode::Sequential);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let result: Result<Holder, _> = serde_yaml::from_str("targets: ''\nmode: sideways");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_target_fails_validation() {
        let config = FanOutConfig {
            targets: TargetList::new(["ok:80", "missing-port"]),
            mode: ExecutionMode::Sequential,
        };
        assert!(config.validate().is_err());
    }
}
