//! Request and response types for the API endpoints

use serde::{Deserialize, Serialize};

fn default_false() -> bool {
    false
}

/// Body of `POST /v1/classify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(rename = "modelName")]
    pub model_name: String,
    pub names: Vec<String>,
    #[serde(rename = "getDistribution", default = "default_false")]
    pub get_distribution: bool,
}

/// Body of `POST /v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModelRequest {
    pub name: String,
    pub nationalities: Vec<String>,
}

/// Body returned by `POST /v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModelResponse {
    pub name: String,
    pub nationalities: Vec<String>,
    #[serde(rename = "modelId")]
    pub model_id: String,
}

/// Body returned by `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub details: std::collections::HashMap<String, serde_json::Value>,
}
