//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval > 0, weights >= 1)
//! - Check backend addresses before anything is built
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{BalancerConfig, Environment};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("backend #{index} address `{address}` is not an absolute http URL")]
    BackendAddress { index: usize, address: String },

    #[error("backend #{index} ({address}) has weight 0")]
    ZeroWeight { index: usize, address: String },

    #[error("environment is external but no backends or servers_path are configured")]
    NoBackends,

    #[error("local.amount must be at least 1")]
    NoLocalBackends,

    #[error("health_check.interval_secs must be greater than 0")]
    ZeroInterval,

    #[error("health_check.path must start with '/'")]
    ProbePath,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if !is_http_url(&backend.address) {
            errors.push(ValidationError::BackendAddress {
                index,
                address: backend.address.clone(),
            });
        }
        if backend.weight == 0 {
            errors.push(ValidationError::ZeroWeight {
                index,
                address: backend.address.clone(),
            });
        }
    }

    match config.environment {
        Environment::External => {
            if config.backends.is_empty() && config.servers_path.is_none() {
                errors.push(ValidationError::NoBackends);
            }
        }
        Environment::Local => {
            if config.local.amount == 0 {
                errors.push(ValidationError::NoLocalBackends);
            }
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::ProbePath);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(address: &str) -> bool {
    Url::parse(address)
        .map(|url| url.scheme() == "http" && url.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BalancerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BalancerConfig::default();
        config.environment = Environment::External;
        config.listener.bind_address = "nope".into();
        config.backends.push(BackendConfig::new("127.0.0.1:8000", 0));
        config.health_check.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("nope".into()),
                ValidationError::BackendAddress {
                    index: 0,
                    address: "127.0.0.1:8000".into()
                },
                ValidationError::ZeroWeight {
                    index: 0,
                    address: "127.0.0.1:8000".into()
                },
                ValidationError::ZeroInterval,
            ]
        );
    }

    #[test]
    fn test_external_requires_backends() {
        let mut config = BalancerConfig::default();
        config.environment = Environment::External;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoBackends]));

        config.servers_path = Some("servers.yaml".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_local_requires_amount() {
        let mut config = BalancerConfig::default();
        config.local.amount = 0;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoLocalBackends]));
    }
}
