//! Structured logging with `tracing`.

use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use tracehop_config::{LogFormat, ServerConfig, TelemetryConfig};

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
pub struct NodeLogger;

impl NodeLogger {
    /// Installs the global subscriber.
    ///
    /// `RUST_LOG` wins over the configured level. Fails if a global subscriber
    /// is already installed.
    pub fn init(config: &TelemetryConfig) -> Result<(), InitError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))?;

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE);

        match config.log_format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Json => builder.json().with_current_span(true).try_init(),
        }
    }

    /// Logs the identity of the node once the configuration is known.
    pub fn log_startup(server: &ServerConfig) {
        info!(
            app_name = %server.app_name,
            environment = %server.environment,
            "Starting node"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn startup_line_names_the_node() {
        NodeLogger::log_startup(&ServerConfig {
            app_name: "edge-node".into(),
            environment: "staging".into(),
            ..ServerConfig::default()
        });
        assert!(logs_contain("Starting node"));
        assert!(logs_contain("app_name=edge-node"));
        assert!(logs_contain("environment=staging"));
    }
}
