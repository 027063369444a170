//! Custom validation functions for configuration.

use validator::ValidationError;

use crate::TargetList;

/// Every target must be `host:port` with a non-empty host and a numeric port.
pub fn validate_targets(targets: &TargetList) -> Result<(), ValidationError> {
    for target in targets.iter() {
        let valid = match target.rsplit_once(':') {
            Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
            None => false,
        };
        if !valid {
            let mut error = ValidationError::new("invalid_target");
            error.message = Some(format!("'{}' is not a host:port address", target).into());
            return Err(error);
        }
    }
    Ok(())
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Collector endpoints must be `http://` or `https://` URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let rest = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"));
    match rest {
        Some(authority) if !authority.is_empty() => Ok(()),
        _ => {
            let mut error = ValidationError::new("invalid_endpoint");
            error.message = Some(format!("'{}' is not an http(s) URL", endpoint).into());
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets() {
        assert!(validate_targets(&TargetList::default()).is_ok());
        assert!(validate_targets(&TargetList::new(["svc:3000", "[::1]:80"])).is_ok());
        assert!(validate_targets(&TargetList::new([":3000"])).is_err());
        assert!(validate_targets(&TargetList::new(["svc:http"])).is_err());
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("loud").is_err());
    }

    #[test]
    fn endpoints() {
        assert!(validate_endpoint("http://collector:4317").is_ok());
        assert!(validate_endpoint("https://otel.example.com").is_ok());
        assert!(validate_endpoint("collector:4317").is_err());
        assert!(validate_endpoint("http://").is_err());
    }
}
