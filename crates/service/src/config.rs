//! Service configuration

use anyhow::{Context, Result};
use demand_lib::artifact::DEFAULT_MODEL_PATH;
use serde::Deserialize;

/// Service configuration, read from `DEMAND_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port for inference, health and metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the model artifact loaded once at startup
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> String {
    DEFAULT_MODEL_PATH.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("DEMAND"))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid DEMAND_* configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("DEMAND").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_environment(environment(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, DEFAULT_MODEL_PATH);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServiceConfig::from_environment(environment(&[
            ("DEMAND_PORT", "9100"),
            ("DEMAND_MODEL_PATH", "/srv/models/demand.json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, "/srv/models/demand.json");
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(ServiceConfig::from_environment(environment(&[("DEMAND_PORT", "http")])).is_err());
    }
}
