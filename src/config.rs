//! Configuration management for the classification server
//!
//! This module handles all configuration settings, including server settings,
//! inference parameters, request limits, artifact locations, and logging.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure for the classification server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Inference configuration
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Request limit configuration
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Artifact store configuration
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Bearer token to user-id bindings; empty disables authentication
    #[serde(default)]
    pub api_tokens: HashMap<String, String>,
}

/// Inference configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Sub-batch size for the forward pass
    pub batch_size: usize,
    /// Device to use for inference (auto, cpu, cuda)
    pub device: String,
}

/// Request limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Hard cap on names per request
    pub max_names_per_request: usize,
    /// Rolling daily per-user name quota
    pub daily_quota: u64,
}

/// Artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Root directory holding one subdirectory per model id
    pub root: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            api_tokens: HashMap::new(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            device: "auto".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_names_per_request: 1000,
            daily_quota: 10_000,
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("model_configurations"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("ONOMA_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("ONOMA_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| EngineError::config("Invalid port number"))?;
        }
        if let Ok(tokens) = std::env::var("ONOMA_API_TOKENS") {
            // "token1=user1,token2=user2"
            for pair in tokens.split(',').filter(|p| !p.is_empty()) {
                let (token, user) = pair
                    .split_once('=')
                    .ok_or_else(|| EngineError::config("Invalid ONOMA_API_TOKENS entry"))?;
                config
                    .server
                    .api_tokens
                    .insert(token.to_string(), user.to_string());
            }
        }

        if let Ok(batch_size) = std::env::var("ONOMA_BATCH_SIZE") {
            config.inference.batch_size = batch_size
                .parse()
                .map_err(|_| EngineError::config("Invalid batch size"))?;
        }
        if let Ok(device) = std::env::var("ONOMA_DEVICE") {
            config.inference.device = device;
        }

        if let Ok(max_names) = std::env::var("ONOMA_MAX_NAMES") {
            config.limits.max_names_per_request = max_names
                .parse()
                .map_err(|_| EngineError::config("Invalid max names per request"))?;
        }
        if let Ok(quota) = std::env::var("ONOMA_DAILY_QUOTA") {
            config.limits.daily_quota = quota
                .parse()
                .map_err(|_| EngineError::config("Invalid daily quota"))?;
        }

        if let Ok(root) = std::env::var("ONOMA_ARTIFACT_ROOT") {
            config.artifacts.root = PathBuf::from(root);
        }

        if let Ok(log_level) = std::env::var("ONOMA_LOG_LEVEL") {
            config.logging.level = log_level;
        }
        if let Ok(log_format) = std::env::var("ONOMA_LOG_FORMAT") {
            config.logging.format = log_format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| EngineError::config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(EngineError::config("Server port cannot be 0"));
        }

        if self.inference.batch_size == 0 {
            return Err(EngineError::config("Batch size must be greater than 0"));
        }
        if !["auto", "cpu", "cuda"].contains(&self.inference.device.as_str()) {
            return Err(EngineError::config("Device must be one of: auto, cpu, cuda"));
        }

        if self.limits.max_names_per_request == 0 {
            return Err(EngineError::config(
                "Max names per request must be greater than 0",
            ));
        }
        if self.limits.daily_quota < self.limits.max_names_per_request as u64 {
            return Err(EngineError::config(
                "Daily quota must not be smaller than the per-request cap",
            ));
        }

        if self.artifacts.root.as_os_str().is_empty() {
            return Err(EngineError::config("Artifact root cannot be empty"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(EngineError::config(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether bearer-token authentication is enabled
    pub fn auth_enabled(&self) -> bool {
        !self.server.api_tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.inference.batch_size, 128);
        assert_eq!(config.limits.max_names_per_request, 1000);
        assert!(!config.auth_enabled());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        config.server.port = 8080;
        config.inference.device = "tpu".to_string();
        assert!(config.validate().is_err());

        config.inference.device = "cpu".to_string();
        config.limits.daily_quota = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_address() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            enable_cors = false

            [server.api_tokens]
            secret = "user-1"

            [limits]
            max_names_per_request = 50
            daily_quota = 500
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.limits.max_names_per_request, 50);
        assert_eq!(config.server.api_tokens.get("secret").unwrap(), "user-1");
        // unspecified sections fall back to defaults
        assert_eq!(config.inference.batch_size, 128);
        assert!(config.validate().is_ok());
    }
}
