//! Utility functions and helpers for the classification server
//!
//! This module contains common utility functions, helpers, and convenience
//! methods used throughout the server.

use crate::error::{EngineError, Result};
use std::path::Path;
use tracing::info;

/// Initialize logging based on configuration
pub fn init_logging(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    info!(
        "Logging initialized with level: {} and format: {}",
        level, format
    );
    Ok(())
}

/// Create directory if it doesn't exist
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created directory: {}", path.display());
    } else if !path.is_dir() {
        return Err(EngineError::config(format!(
            "Path exists but is not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Format duration in human-readable format
pub fn format_duration(duration: std::time::Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if seconds > 0 {
        format!("{}.{:03}s", seconds, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Validate model name format
pub fn validate_model_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::invalid_request("Model name cannot be empty"));
    }

    if name.contains(|c: char| c.is_control() || "\"'<>&".contains(c)) {
        return Err(EngineError::invalid_request(
            "Model name contains invalid characters",
        ));
    }

    Ok(())
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4())
}
