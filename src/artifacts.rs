//! Model artifact storage
//!
//! Serialized weights and serving configuration are looked up by model id
//! through the [`ArtifactStore`] trait. "Not found" is a distinct outcome
//! (`Ok(None)`) from store failures, so callers can tell a missing model from
//! a broken backend. The filesystem implementation lays artifacts out as
//! `<root>/<model_id>/{model.safetensors, config.json}`; the S3/MinIO backend
//! used in production deployments sits behind the same trait.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serving configuration for one trained model, stored alongside its weights.
///
/// Field names match the training pipeline's JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHyperparams {
    #[serde(rename = "embedding-size")]
    pub embedding_size: usize,
    #[serde(rename = "hidden-size")]
    pub hidden_size: usize,
    #[serde(rename = "rnn-layers")]
    pub rnn_layers: usize,
    /// `[input-channels, kernel-size, output-channels]`; serving reads
    /// indices 1 and 2
    #[serde(rename = "cnn-parameters")]
    pub cnn_parameters: Vec<usize>,
}

impl ModelHyperparams {
    pub fn kernel_size(&self) -> Result<usize> {
        self.cnn_parameters
            .get(1)
            .copied()
            .ok_or_else(|| EngineError::model("cnn-parameters missing kernel size"))
    }

    pub fn channels(&self) -> Result<usize> {
        self.cnn_parameters
            .get(2)
            .copied()
            .ok_or_else(|| EngineError::model("cnn-parameters missing channel count"))
    }
}

/// Content-addressed lookup of model artifacts by model id.
pub trait ArtifactStore: Send + Sync {
    /// Fetch the serialized weights for a model, `None` if absent
    fn get_weights(&self, model_id: &str) -> Result<Option<Vec<u8>>>;

    /// Fetch the serving hyperparameters for a model, `None` if absent
    fn get_hyperparams(&self, model_id: &str) -> Result<Option<ModelHyperparams>>;
}

/// Filesystem-backed artifact store
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn read_optional(&self, model_id: &str, file: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(model_id).join(file);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::store(format!(
                "failed to read artifact {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn get_weights(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        self.read_optional(model_id, "model.safetensors")
    }

    fn get_hyperparams(&self, model_id: &str) -> Result<Option<ModelHyperparams>> {
        match self.read_optional(model_id, "config.json")? {
            Some(bytes) => {
                let params: ModelHyperparams = serde_json::from_slice(&bytes).map_err(|e| {
                    EngineError::model(format!("corrupt config for model {}: {}", model_id, e))
                })?;
                Ok(Some(params))
            }
            None => Ok(None),
        }
    }
}
