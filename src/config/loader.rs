//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{BackendConfig, BalancerConfig};
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Descriptor error in {path}: {reason}")]
    Descriptor { path: String, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

/// Backend descriptor file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
}

impl DescriptorFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(DescriptorFormat::Json),
            Some("yaml") | Some("yml") => Some(DescriptorFormat::Yaml),
            _ => None,
        }
    }
}

/// Load configuration from a TOML file.
///
/// Not validated here: command-line flags may still change it, and
/// [`validate_config`](crate::config::validate_config) runs once they are applied.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = read(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load backend descriptors from a JSON or YAML file.
pub fn load_descriptors(path: &Path) -> Result<Vec<BackendConfig>, ConfigError> {
    let format = DescriptorFormat::from_path(path).ok_or_else(|| ConfigError::Descriptor {
        path: path.display().to_string(),
        reason: "expected a .json, .yaml or .yml file".to_string(),
    })?;

    let content = read(path)?;
    parse_descriptors(&content, format).map_err(|reason| ConfigError::Descriptor {
        path: path.display().to_string(),
        reason,
    })
}

/// Parse a descriptor list. Unnamed entries get their positional index as name.
pub fn parse_descriptors(content: &str, format: DescriptorFormat) -> Result<Vec<BackendConfig>, String> {
    let mut descriptors: Vec<BackendConfig> = match format {
        DescriptorFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string())?,
        DescriptorFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string())?,
    };

    for (index, descriptor) in descriptors.iter_mut().enumerate() {
        if descriptor.name.is_none() {
            descriptor.name = Some(index.to_string());
        }
    }

    Ok(descriptors)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{validate_config, BalancingMethod, Environment};

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: BalancerConfig = toml::from_str("").unwrap();
        assert_eq!(config.method, BalancingMethod::RoundRobin);
        assert_eq!(config.environment, Environment::Local);
        assert_eq!(config.listener.bind_address, "0.0.0.0:7000");
        assert_eq!(config.health_check.interval_secs, 20);
        assert_eq!(config.local.amount, 5);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            method = "wrr"
            environment = "external"

            [listener]
            bind_address = "127.0.0.1:7100"

            [[backends]]
            address = "http://127.0.0.1:8000"
            weight = 5

            [[backends]]
            addr = "http://127.0.0.1:8001"

            [health_check]
            interval_secs = 2

            [scheduler]
            fail_when_unhealthy = true
        "#;
        let config: BalancerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.method, BalancingMethod::WeightedRoundRobin);
        assert_eq!(config.environment, Environment::External);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].weight, 5);
        assert_eq!(config.backends[1].weight, 1);
        assert_eq!(config.backends[1].address, "http://127.0.0.1:8001");
        assert_eq!(config.health_check.interval_secs, 2);
        assert_eq!(config.health_check.path, "/");
        assert!(config.scheduler.fail_when_unhealthy);
    }

    #[test]
    fn test_json_descriptors() {
        let json = r#"[
            {"addr": "http://10.0.0.1:80", "weight": 3},
            {"addr": "http://10.0.0.2:80", "weight": 1}
        ]"#;
        let servers = parse_descriptors(json, DescriptorFormat::Json).unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].name.as_deref(), Some("0"));
        assert_eq!(servers[1].name.as_deref(), Some("1"));
        assert_eq!(servers[0].weight, 3);
    }

    #[test]
    fn test_yaml_descriptors() {
        let yaml = "- addr: http://10.0.0.1:80\n  weight: 2\n- address: http://10.0.0.2:80\n  name: spare\n";
        let servers = parse_descriptors(yaml, DescriptorFormat::Yaml).unwrap();
        assert_eq!(servers[0].weight, 2);
        assert_eq!(servers[1].weight, 1);
        assert_eq!(servers[1].name.as_deref(), Some("spare"));
    }

    #[test]
    fn test_descriptor_format_from_extension() {
        assert_eq!(DescriptorFormat::from_path(Path::new("s.json")), Some(DescriptorFormat::Json));
        assert_eq!(DescriptorFormat::from_path(Path::new("s.yml")), Some(DescriptorFormat::Yaml));
        assert_eq!(DescriptorFormat::from_path(Path::new("s.txt")), None);
    }

    #[test]
    fn test_sample_files_parse() {
        let config: BalancerConfig = toml::from_str(include_str!("../../balancer.toml")).unwrap();
        assert_eq!(validate_config(&config), Ok(()));

        let servers = parse_descriptors(include_str!("../../servers.yaml"), DescriptorFormat::Yaml).unwrap();
        let weights: Vec<_> = servers.iter().map(|s| s.weight).collect();
        assert_eq!(weights, [5, 2, 3]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_descriptors(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
