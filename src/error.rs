//! Error handling for the name classification engine
//!
//! This module provides a unified error type with proper mapping to HTTP
//! status codes and structured error responses carrying stable machine codes.

use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the classification engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The request asked for more names than the per-request cap allows
    #[error("Too many names (maximum {max})")]
    TooManyNames { max: usize },

    /// The request would push the user over the daily name quota
    #[error("Daily quota exceeded by {overage} names")]
    QuotaExceeded { overage: u64 },

    /// No model with the given name is bound for the user or public
    #[error("Model with name '{name}' does not exist for this user")]
    ModelNotFound { name: String },

    /// The model name is already taken for this user or by a public model
    #[error("Model with name '{name}' already exists for this user")]
    ModelNameExists { name: String },

    /// The requested class list is invalid
    #[error("Invalid classes: {message}")]
    InvalidClasses { message: String },

    /// Malformed request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Missing or unknown credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Model artifact loading or inference errors
    #[error("Model error: {message}")]
    Model { message: String },

    /// Pipeline contract violations (encoding, batching, score shapes)
    #[error("Processing error: {message}")]
    Processing { message: String },

    /// Backing store errors (registry, quota, artifacts)
    #[error("Store error: {message}")]
    Store { message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Tensor framework errors
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error response body: `{"errorCode": ..., "message": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    pub message: String,
}

impl EngineError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create a processing error
    pub fn processing<S: Into<String>>(message: S) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an invalid classes error
    pub fn invalid_classes<S: Into<String>>(message: S) -> Self {
        Self::InvalidClasses {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Config { .. } => "CONFIG_ERROR",
            EngineError::TooManyNames { .. } => "TOO_MANY_NAMES",
            EngineError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            EngineError::ModelNotFound { .. } => "MODEL_DOES_NOT_EXIST",
            EngineError::ModelNameExists { .. } => "MODEL_NAME_EXISTS",
            EngineError::InvalidClasses { .. } => "INVALID_CLASSES",
            EngineError::InvalidRequest { .. } => "INVALID_REQUEST",
            EngineError::Unauthorized { .. } => "UNAUTHORIZED",
            EngineError::Model { .. } => "MODEL_ERROR",
            EngineError::Processing { .. } => "PROCESSING_ERROR",
            EngineError::Store { .. } => "STORE_ERROR",
            EngineError::Io(_) => "IO_ERROR",
            EngineError::Serde(_) => "SERIALIZATION_ERROR",
            EngineError::Candle(_) => "ML_ERROR",
        }
    }

    /// Convert to an error response body for the API
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl ResponseError for EngineError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            EngineError::TooManyNames { .. } | EngineError::InvalidClasses { .. } => {
                actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
            }
            EngineError::QuotaExceeded { .. } => actix_web::http::StatusCode::TOO_MANY_REQUESTS,
            EngineError::ModelNotFound { .. } => actix_web::http::StatusCode::NOT_FOUND,
            EngineError::ModelNameExists { .. } => actix_web::http::StatusCode::CONFLICT,
            EngineError::InvalidRequest { .. } => actix_web::http::StatusCode::BAD_REQUEST,
            EngineError::Unauthorized { .. } => actix_web::http::StatusCode::UNAUTHORIZED,
            EngineError::Config { .. }
            | EngineError::Model { .. }
            | EngineError::Processing { .. }
            | EngineError::Store { .. }
            | EngineError::Io(_)
            | EngineError::Serde(_)
            | EngineError::Candle(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        HttpResponse::build(status).json(self.to_error_response())
    }
}
