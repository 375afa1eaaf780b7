//! Name-to-nationality classification server
//!
//! Classifies personal names into likely nationality labels with a trained
//! character-level ConvLSTM, behind an authenticated HTTP API with per-user
//! model bindings, daily quotas, and request counters.
//!
//! The pipeline: normalize each name to the model alphabet, encode it to
//! character indices, pad and chunk into batches, run the model, then turn
//! log-probabilities into confidence scores. Model identity resolution and
//! quota enforcement gate the pipeline on both sides.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod inference;
pub mod model;
pub mod quota;
pub mod registry;
pub mod scores;
pub mod test_utils;
pub mod text;
pub mod utils;

use crate::artifacts::FsArtifactStore;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::inference::ClassificationEngine;
use crate::quota::InMemoryQuotaStore;
use crate::registry::InMemoryRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Version of the server
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the classification engine from configuration.
///
/// Builds a filesystem artifact store rooted at the configured directory and
/// in-memory registry and quota stores. A `catalog.json` file at the artifact
/// root, mapping public model names to class lists, seeds the public catalog.
pub fn init_engine(config: &Config) -> Result<ClassificationEngine> {
    utils::ensure_directory(&config.artifacts.root)?;

    let registry = Arc::new(InMemoryRegistry::new());
    let catalog_path = config.artifacts.root.join("catalog.json");
    match std::fs::read(&catalog_path) {
        Ok(bytes) => {
            let catalog: HashMap<String, Vec<String>> =
                serde_json::from_slice(&bytes).map_err(|e| {
                    EngineError::config(format!(
                        "corrupt catalog file {}: {}",
                        catalog_path.display(),
                        e
                    ))
                })?;
            for (public_name, classes) in &catalog {
                let identity = registry.add_public_model(public_name, classes);
                info!(
                    name = %public_name,
                    model_id = %identity.model_id,
                    "seeded public model"
                );
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("no public model catalog found, starting with an empty catalog");
        }
        Err(e) => return Err(e.into()),
    }

    let artifacts = Arc::new(FsArtifactStore::new(config.artifacts.root.clone()));
    let quota = Arc::new(InMemoryQuotaStore::new());

    ClassificationEngine::new(config.clone(), registry, quota, artifacts)
}
