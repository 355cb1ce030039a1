//! Configuration file support for the tumorscan server.
//!
//! Supports both YAML and TOML configuration files.
//!
//! # Example YAML configuration:
//! ```yaml
//! # Tumorscan configuration file
//!
//! # Server settings
//! server:
//!   port: 5000
//!   bind: "127.0.0.1"
//!   metrics_enabled: true
//!   metrics_port: 9090
//!   max_upload_bytes: 10485760
//!
//! # Model artifacts
//! model:
//!   model_file: best_model.onnx
//!   labels_file: class_names.json
//!
//! # Logging settings
//! logging:
//!   level: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Model artifact configuration
    pub model: ModelConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Bind address
    pub bind: String,

    /// Enable metrics endpoint
    pub metrics_enabled: bool,

    /// Metrics port
    pub metrics_port: u16,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind: "127.0.0.1".to_string(),
            metrics_enabled: false,
            metrics_port: 9090,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the trained model artifact (ONNX)
    pub model_file: PathBuf,

    /// Path to the class names JSON file, index-aligned with the model output
    pub labels_file: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_file: PathBuf::from("best_model.onnx"),
            labels_file: PathBuf::from("class_names.json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML, auto-detected by extension)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "toml" => Self::from_toml(&content),
            _ => {
                // Try YAML first, then TOML
                Self::from_yaml(&content).or_else(|_| Self::from_toml(&content))
            }
        }
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Create an example configuration
    pub fn example() -> Self {
        Self {
            server: ServerConfig {
                port: 5000,
                bind: "0.0.0.0".to_string(),
                metrics_enabled: true,
                metrics_port: 9090,
                max_upload_bytes: 10 * 1024 * 1024,
            },
            model: ModelConfig {
                model_file: PathBuf::from("/app/models/best_model.onnx"),
                labels_file: PathBuf::from("/app/models/class_names.json"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Generate example YAML configuration
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::example()).unwrap_or_default()
    }

    /// Generate example TOML configuration
    pub fn example_toml() -> String {
        toml::to_string_pretty(&Self::example()).unwrap_or_default()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert!(!config.server.metrics_enabled);
        assert_eq!(config.model.model_file, PathBuf::from("best_model.onnx"));
        assert_eq!(config.model.labels_file, PathBuf::from("class_names.json"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
server:
  port: 8080
  bind: "0.0.0.0"
  metrics_enabled: true
model:
  model_file: /models/tumor.onnx
  labels_file: /models/classes.json
logging:
  level: debug
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert!(config.server.metrics_enabled);
        assert_eq!(config.model.model_file, PathBuf::from("/models/tumor.onnx"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
[server]
port = 8080
bind = "0.0.0.0"
max_upload_bytes = 1048576

[model]
model_file = "/models/tumor.onnx"
labels_file = "/models/classes.json"
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_bytes, 1048576);
        assert_eq!(
            config.model.labels_file,
            PathBuf::from("/models/classes.json")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
server:
  port: 9999
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.model.labels_file, PathBuf::from("class_names.json"));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = Config::from_yaml("server: [not, a, map]");
        assert!(result.is_err());
    }

    #[test]
    fn test_example_yaml_round_trips() {
        let yaml = Config::example_yaml();
        let config = Config::from_yaml(&yaml).unwrap();
        assert!(config.server.metrics_enabled);
        assert_eq!(config.server.bind, "0.0.0.0");
    }

    #[test]
    fn test_example_toml_round_trips() {
        let toml = Config::example_toml();
        let config = Config::from_toml(&toml).unwrap();
        assert_eq!(config.server.port, 5000);
    }
}
