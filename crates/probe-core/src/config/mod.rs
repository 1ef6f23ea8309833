//! Configuration types for Probe.
//!
//! A single `ProbeConfig` groups the server, planner and executor settings.
//! It can be loaded from a TOML (`probe.toml`) or YAML (`probe.yaml`) file;
//! every field has a default, so an empty file is a valid configuration.
//!
//! # Lookup order
//!
//! 1. An explicit path (`--config`)
//! 2. The `PROBE_CONFIG` environment variable
//! 3. Built-in defaults

pub mod executor;
pub mod planner;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use executor::{ExecutorConfig, UnresolvedPathPolicy};
pub use planner::PlannerConfig;
pub use server::ServerConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PROBE_CONFIG";

/// Complete Probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProbeConfig {
    /// HTTP boundary settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Call synthesis settings.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Dispatch settings.
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config format: {0} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProbeConfig {
    /// Load configuration from a TOML or YAML file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Resolve the config file from an explicit path or `PROBE_CONFIG`,
    /// falling back to defaults when neither is set.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values no run could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.planner.max_schema_depth == 0 {
            return Err(ConfigError::Config(
                "planner.max_schema_depth must be at least 1".to_string(),
            ));
        }
        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::Config(
                "executor.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !matches!(self.planner.default_scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Config(format!(
                "planner.default_scheme must be http or https, got {}",
                self.planner.default_scheme
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.planner.default_scheme, "https");
        assert_eq!(config.planner.fallback_value, "dummy");
        assert_eq!(config.executor.unresolved_path_policy, UnresolvedPathPolicy::Synthesize);
        assert!(config.executor.strip_path_params);
        assert_eq!(config.executor.path_fallback_value, "1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ProbeConfig::from_toml(
            r#"
            [server]
            port = 9000

            [executor]
            unresolved_path_policy = "skip"
            strip_path_params = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.executor.unresolved_path_policy, UnresolvedPathPolicy::Skip);
        assert!(!config.executor.strip_path_params);
        assert_eq!(config.planner.max_schema_depth, 8);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "planner:\n  seed: 7\n  default_scheme: http").unwrap();

        let config = ProbeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.planner.seed, Some(7));
        assert_eq!(config.planner.default_scheme, "http");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ProbeConfig::from_yaml("  \n").unwrap(), ProbeConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ProbeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[executor]\ntimeout_secs = 0").unwrap();

        let err = ProbeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_port_override() {
        let mut server = ServerConfig::default();
        server.apply_port_override(Some("9100"));
        assert_eq!(server.port, 9100);
        server.apply_port_override(Some("not-a-port"));
        assert_eq!(server.port, 9100);
    }
}
