//! Classification engine orchestrating the full request pipeline
//!
//! Flow per request: resolve the model identity, check quota, normalize and
//! encode the names into batches, load the model and run inference, interpret
//! the scores, then commit quota usage and bump request counters. Quota is
//! charged only after inference succeeded, so a mid-pipeline failure leaves
//! all usage state untouched.

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::error::Result;
use crate::model::{select_device, ModelRunner};
use crate::quota::{QuotaGuard, QuotaStore};
use crate::registry::{resolve_model, ModelCatalog, ModelIdentity, ModelRegistry};
use crate::scores::{interpret, Prediction};
use crate::text::encode_batches;
use candle_core::Device;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A classification request after API-level validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub model_name: String,
    pub names: Vec<String>,
    pub get_distribution: bool,
}

/// Engine-wide statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub names_classified: u64,
    pub avg_inference_time_ms: f64,
}

/// Main engine coordinating stores, model execution, and quota accounting.
///
/// Store handles are injected explicitly; the engine holds no global state.
pub struct ClassificationEngine {
    config: Config,
    registry: Arc<dyn ModelRegistry>,
    quota_store: Arc<dyn QuotaStore>,
    artifacts: Arc<dyn ArtifactStore>,
    quota_guard: QuotaGuard,
    device: Device,
    stats: Arc<RwLock<EngineStats>>,
}

impl std::fmt::Debug for ClassificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationEngine")
            .field("config", &self.config)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl ClassificationEngine {
    pub fn new(
        config: Config,
        registry: Arc<dyn ModelRegistry>,
        quota_store: Arc<dyn QuotaStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Result<Self> {
        let device = select_device(&config.inference.device)?;
        let quota_guard = QuotaGuard::new(
            config.limits.max_names_per_request,
            config.limits.daily_quota,
        );

        info!(?device, "classification engine initialized");

        Ok(Self {
            config,
            registry,
            quota_store,
            artifacts,
            quota_guard,
            device,
            stats: Arc::new(RwLock::new(EngineStats::default())),
        })
    }

    /// Classify a batch of names on behalf of a user.
    ///
    /// Results are positionally aligned with the input name list.
    pub fn classify(&self, user_id: &str, request: &ClassificationRequest) -> Result<Vec<Prediction>> {
        self.classify_on(user_id, request, Utc::now().date_naive())
    }

    /// Like [`classify`](Self::classify) with an explicit date, so tests can
    /// drive day rollovers.
    pub fn classify_on(
        &self,
        user_id: &str,
        request: &ClassificationRequest,
        today: NaiveDate,
    ) -> Result<Vec<Prediction>> {
        let start_time = Instant::now();
        {
            let mut stats = self.stats.write();
            stats.total_requests += 1;
        }

        let result = self.classify_inner(user_id, request, today);

        let elapsed_ms = start_time.elapsed().as_millis() as f64;
        let mut stats = self.stats.write();
        match &result {
            Ok(predictions) => {
                stats.successful_requests += 1;
                stats.names_classified += predictions.len() as u64;
                let total = stats.avg_inference_time_ms * (stats.successful_requests - 1) as f64;
                stats.avg_inference_time_ms = (total + elapsed_ms) / stats.successful_requests as f64;
            }
            Err(_) => {
                stats.failed_requests += 1;
            }
        }

        result
    }

    fn classify_inner(
        &self,
        user_id: &str,
        request: &ClassificationRequest,
        today: NaiveDate,
    ) -> Result<Vec<Prediction>> {
        let identity = resolve_model(self.registry.as_ref(), user_id, &request.model_name)?;
        debug!(
            model_id = %identity.model_id,
            names = request.names.len(),
            "resolved model for classification"
        );

        // gate before any expensive work; nothing is charged yet
        self.quota_guard.check(
            self.quota_store.as_ref(),
            user_id,
            request.names.len(),
            today,
        )?;

        let batches = encode_batches(&request.names, self.config.inference.batch_size)?;

        let runner = ModelRunner::load(
            self.artifacts.as_ref(),
            &identity.model_id,
            identity.classes.len(),
            self.device.clone(),
        )?;
        let log_probs = runner.run(&batches)?;

        let predictions = interpret(&log_probs, &identity.classes, request.get_distribution)?;

        // commit usage only now that inference succeeded
        self.quota_guard.commit(
            self.quota_store.as_ref(),
            user_id,
            request.names.len(),
            today,
        )?;
        self.registry
            .increment_counters(user_id, &identity.model_id, request.names.len())?;

        info!(
            model_id = %identity.model_id,
            names = request.names.len(),
            "successfully classified names"
        );

        Ok(predictions)
    }

    /// Bind a new custom model name to a class set for a user.
    pub fn register_model(
        &self,
        user_id: &str,
        name: &str,
        classes: &[String],
    ) -> Result<ModelIdentity> {
        self.registry.register_model(user_id, name, classes)
    }

    /// All models visible to a user.
    pub fn list_models(&self, user_id: &str) -> Result<ModelCatalog> {
        self.registry.list_models(user_id)
    }

    /// Snapshot of engine statistics.
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Health probe used by the API layer.
    pub fn is_healthy(&self) -> bool {
        // the engine has no long-lived connections; construction succeeding
        // means the device is usable
        true
    }
}
