//! Listener and identity configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use validator::{self, Validate, ValidationError};

/// HTTP listener configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Service name reported in logs.
    #[validate(length(min = 1))]
    pub app_name: String,

    /// Deployment environment label (development, staging, production, ...).
    pub environment: String,

    /// Interface to bind.
    #[validate(custom(function = validate_host))]
    pub host: String,

    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
}

impl ServerConfig {
    /// Socket address the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn validate_host(host: &str) -> Result<(), ValidationError> {
    if format!("{}:0", host).parse::<SocketAddr>().is_ok() || host == "localhost" {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_bind_host"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "tracehop".into(),
            environment: "development".into(),
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unparseable_host() {
        let config = ServerConfig {
            host: "not a host".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
