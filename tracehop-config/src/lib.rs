//! # Tracehop Configuration System
//!
//! Startup configuration for a tracehop node. Everything here is read exactly
//! once, validated, and then handed out as immutable values; nothing in the
//! node mutates configuration after `NodeConfig::load` returns.
//!
//! ## Sources (lowest to highest precedence)
//! 1. Built-in defaults
//! 2. `config/tracehop.yaml` (or an explicit path)
//! 3. `config/<environment>.yaml`, named by `server.environment` (default file only)
//! 4. Legacy flat environment names (`HANDLE_TIME`, `ERROR_RATE`, `FORWARD_TO`, ...)
//! 5. `TRACEHOP_*` environment variables, `__` separating nested keys

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod client;
mod error;
mod fanout;
mod server;
mod simulation;
mod telemetry;
mod validation;

pub use client::ClientConfig;
pub use error::ConfigError;
pub use fanout::{ExecutionMode, FanOutConfig, TargetList};
pub use server::ServerConfig;
pub use simulation::SimulationConfig;
pub use telemetry::{LogFormat, TelemetryConfig, TraceExporter};

/// Directory searched for the base file and per-environment overrides.
pub const CONFIG_DIR: &str = "config";

/// Default location of the optional YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/tracehop.yaml";

/// Flat environment names understood for compatibility with existing
/// deployments, mapped onto their nested configuration keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("HANDLE_TIME", "simulation.latency_ms"),
    ("ERROR_RATE", "simulation.error_rate_percent"),
    ("FORWARD_TO", "fanout.targets"),
    ("CALL_PARALLEL", "fanout.mode"),
    ("APP_NAME", "server.app_name"),
    ("APP_ENV", "server.environment"),
    ("PORT", "server.port"),
];

/// Top-level configuration container for a tracehop node.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Listener and identity settings.
    #[validate(nested)]
    pub server: ServerConfig,

    /// Synthetic workload parameters.
    #[validate(nested)]
    pub simulation: SimulationConfig,

    /// Downstream peers and how they are called.
    #[validate(nested)]
    pub fanout: FanOutConfig,

    /// Outbound HTTP client settings.
    #[validate(nested)]
    pub client: ClientConfig,

    /// Logging settings.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Load configuration from the default file location and the environment.
    ///
    /// A missing `config/tracehop.yaml` is not an error; defaults are used.
    /// The environment name (`server.environment`, also settable through
    /// `APP_ENV`) selects an optional `config/<environment>.yaml` overlay that
    /// sits between the base file and the environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(NodeConfig::default()));

        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            figment = figment.merge(Yaml::file(DEFAULT_CONFIG_PATH));
        }

        let environment: String = with_environment(figment.clone())
            .extract_inner("server.environment")
            .unwrap_or_else(|_| ServerConfig::default().environment);
        let overlay = Path::new(CONFIG_DIR).join(format!("{}.yaml", environment));
        if overlay.exists() {
            figment = figment.merge(Yaml::file(overlay));
        }

        Self::from_figment(with_environment(figment))
    }

    /// Load configuration from a specific YAML file, still honoring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(NodeConfig::default())).merge(Yaml::file(path));

        Self::from_figment(with_environment(figment))
    }

    /// Extract and validate a configuration from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

fn with_environment(figment: Figment) -> Figment {
    figment
        .merge(legacy_env())
        .merge(Env::prefixed("TRACEHOP_").split("__"))
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = NodeConfig::default();
        config.validate().expect("default config should validate");
        assert_eq!(config.simulation.latency(), Duration::from_millis(100));
        assert_eq!(config.simulation.error_rate_percent, 0);
        assert!(config.fanout.targets.is_empty());
        assert_eq!(config.fanout.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn load_without_sources_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = NodeConfig::load().expect("load");
            assert_eq!(config, NodeConfig::default());
            Ok(())
        });
    }

    #[test]
    fn legacy_environment_names() {
        Jail::expect_with(|jail| {
            jail.set_env("HANDLE_TIME", "25");
            jail.set_env("ERROR_RATE", "40");
            jail.set_env("FORWARD_TO", "svc-a:3001,svc-b:3002,");
            jail.set_env("CALL_PARALLEL", "true");
            jail.set_env("PORT", "8080");

            let config = NodeConfig::load().expect("load");
            assert_eq!(config.simulation.latency(), Duration::from_millis(25));
            assert_eq!(config.simulation.error_rate_percent, 40);
            assert_eq!(
                config.fanout.targets.as_slice(),
                &["svc-a:3001".to_string(), "svc-b:3002".to_string()]
            );
            assert_eq!(config.fanout.mode, ExecutionMode::Parallel);
            assert_eq!(config.server.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn prefixed_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                DEFAULT_CONFIG_PATH,
                "simulation:\n  latency_ms: 5\n  error_rate_percent: 10\n\
                 fanout:\n  targets: [\"a:1\", \"b:2\"]\n  mode: parallel\n",
            )?;
            jail.set_env("TRACEHOP_SIMULATION__ERROR_RATE_PERCENT", "0");

            let config = NodeConfig::load().expect("load");
            assert_eq!(config.simulation.latency_ms, 5);
            assert_eq!(config.simulation.error_rate_percent, 0);
            assert_eq!(config.fanout.targets.len(), 2);
            assert_eq!(config.fanout.mode, ExecutionMode::Parallel);
            Ok(())
        });
    }

    #[test]
    fn environment_file_overrides_base_file() {
        Jail::expect_with(|jail| {
            jail.create_dir(CONFIG_DIR)?;
            jail.create_file(
                DEFAULT_CONFIG_PATH,
                "server:\n  environment: staging\n\
                 simulation:\n  latency_ms: 5\n  error_rate_percent: 10\n",
            )?;
            jail.create_file("config/staging.yaml", "simulation:\n  error_rate_percent: 30\n")?;
            jail.create_file("config/production.yaml", "simulation:\n  latency_ms: 900\n")?;

            let config = NodeConfig::load().expect("load");
            assert_eq!(config.server.environment, "staging");
            assert_eq!(config.simulation.latency_ms, 5);
            assert_eq!(config.simulation.error_rate_percent, 30);

            jail.set_env("APP_ENV", "production");
            let config = NodeConfig::load().expect("load");
            assert_eq!(config.simulation.latency_ms, 900);
            assert_eq!(config.simulation.error_rate_percent, 10);

            jail.set_env("ERROR_RATE", "0");
            let config = NodeConfig::load().expect("load");
            assert_eq!(config.simulation.error_rate_percent, 0);
            Ok(())
        });
    }

    #[test]
    fn non_numeric_latency_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("HANDLE_TIME", "slow");
            let err = NodeConfig::load().expect_err("must fail");
            assert!(matches!(err, ConfigError::Parsing(_)));
            Ok(())
        });
    }

    #[test]
    fn error_rate_above_hundred_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ERROR_RATE", "101");
            let err = NodeConfig::load().expect_err("must fail");
            assert!(matches!(err, ConfigError::Validation(_)));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        let err = NodeConfig::load_from_path("does/not/exist.yaml").expect_err("must fail");
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "node.yaml",
                "server:\n  app_name: edge\n  port: 4000\nclient:\n  timeout_ms: 250\n",
            )?;
            let config = NodeConfig::load_from_path("node.yaml").expect("load");
            assert_eq!(config.server.app_name, "edge");
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.client.timeout(), Some(Duration::from_millis(250)));
            Ok(())
        });
    }

    #[test]
    fn example_file_is_valid() {
        Jail::expect_with(|_jail| {
            let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/tracehop.example.yaml");
            let config = NodeConfig::load_from_path(path).expect("load");
            assert_eq!(config.client.timeout_ms, Some(2000));
            assert!(config.fanout.targets.is_empty());
            Ok(())
        });
    }

    #[test]
    fn effective_config_serializes() {
        let yaml = serde_yaml::to_string(&NodeConfig::default()).expect("serialize");
        assert!(yaml.contains("mode: sequential"));
        assert!(yaml.contains("latency_ms: 100"));
    }
}
