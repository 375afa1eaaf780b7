//! Model identity resolution and usage counters
//!
//! Users address models by a name of their own choosing; public models carry
//! one canonical name. Resolution checks the user's own bindings first, then
//! the public catalog, so personal names shadow the shared catalog without
//! colliding across users. The underlying model id is a deterministic hash of
//! the sorted, de-duplicated class set, letting identical class sets share one
//! trained artifact.

use crate::error::{EngineError, Result};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A resolved model: its content-addressed id and ordered class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelIdentity {
    pub model_id: String,
    pub classes: Vec<String>,
}

/// Catalog entry returned by model listings
#[derive(Debug, Clone, Serialize)]
pub struct ModelListing {
    pub name: String,
    pub nationalities: Vec<String>,
    #[serde(rename = "requestCount")]
    pub request_count: u64,
}

/// Public catalog plus the user's own bindings
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    #[serde(rename = "defaultModels")]
    pub default_models: Vec<ModelListing>,
    #[serde(rename = "customModels")]
    pub custom_models: Vec<ModelListing>,
}

/// Derive the stable model id for a class set.
///
/// SHA-256 over the comma-joined, sorted, de-duplicated class names,
/// truncated to 20 hex characters. Order and duplicates in the input do not
/// change the id; any difference in the set does.
pub fn model_id_for_classes(classes: &[String]) -> String {
    let mut unique: Vec<&str> = classes.iter().map(String::as_str).collect();
    unique.sort_unstable();
    unique.dedup();

    let digest = Sha256::digest(unique.join(",").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..20].to_string()
}

/// Registry of models, per-user bindings, and request counters.
///
/// Expressed as a trait over an explicit handle so tests can inject an
/// in-memory store; the production registry is ORM-backed behind the same
/// interface.
pub trait ModelRegistry: Send + Sync {
    /// Look up a user-owned binding by `(user_id, name)`
    fn find_user_model(&self, user_id: &str, name: &str) -> Result<Option<ModelIdentity>>;

    /// Look up a public model by its canonical name
    fn find_public_model(&self, name: &str) -> Result<Option<ModelIdentity>>;

    /// Bind a new custom model name to a class set for a user
    fn register_model(&self, user_id: &str, name: &str, classes: &[String])
        -> Result<ModelIdentity>;

    /// Bump user, model, and user-model-link counters after a successful
    /// classification
    fn increment_counters(&self, user_id: &str, model_id: &str, name_count: usize) -> Result<()>;

    /// All models visible to the user
    fn list_models(&self, user_id: &str) -> Result<ModelCatalog>;
}

/// Resolve a user-facing model name to an identity.
///
/// User bindings take precedence over the public catalog; an unmatched name
/// is a `MODEL_DOES_NOT_EXIST` failure.
pub fn resolve_model(
    registry: &dyn ModelRegistry,
    user_id: &str,
    name: &str,
) -> Result<ModelIdentity> {
    if let Some(identity) = registry.find_user_model(user_id, name)? {
        return Ok(identity);
    }
    if let Some(identity) = registry.find_public_model(name)? {
        return Ok(identity);
    }
    Err(EngineError::ModelNotFound {
        name: name.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
struct ModelRecord {
    classes: Vec<String>,
    request_count: u64,
    names_classified: u64,
}

#[derive(Debug, Clone)]
struct Binding {
    user_id: String,
    name: String,
    model_id: String,
    request_count: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    models: HashMap<String, ModelRecord>,
    bindings: Vec<Binding>,
    // canonical public name -> model id
    public_models: HashMap<String, String>,
    user_request_counts: HashMap<String, u64>,
}

/// In-memory registry for tests and single-node deployments
#[derive(Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a model under a canonical public name.
    pub fn add_public_model(&self, public_name: &str, classes: &[String]) -> ModelIdentity {
        let mut sorted: Vec<String> = classes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let model_id = model_id_for_classes(&sorted);
        let mut state = self.state.write();
        state
            .models
            .entry(model_id.clone())
            .or_insert_with(|| ModelRecord {
                classes: sorted.clone(),
                ..Default::default()
            });
        state
            .public_models
            .insert(public_name.to_string(), model_id.clone());

        ModelIdentity {
            model_id,
            classes: sorted,
        }
    }

    /// Total requests recorded for a user (tests)
    pub fn user_request_count(&self, user_id: &str) -> u64 {
        self.state
            .read()
            .user_request_counts
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn find_user_model(&self, user_id: &str, name: &str) -> Result<Option<ModelIdentity>> {
        let state = self.state.read();
        let binding = state
            .bindings
            .iter()
            .find(|b| b.user_id == user_id && b.name == name);

        match binding {
            Some(binding) => {
                let record = state.models.get(&binding.model_id).ok_or_else(|| {
                    EngineError::store(format!("dangling binding to model {}", binding.model_id))
                })?;
                Ok(Some(ModelIdentity {
                    model_id: binding.model_id.clone(),
                    classes: record.classes.clone(),
                }))
            }
            None => Ok(None),
        }
    }

    fn find_public_model(&self, name: &str) -> Result<Option<ModelIdentity>> {
        let state = self.state.read();
        match state.public_models.get(name) {
            Some(model_id) => {
                let record = state.models.get(model_id).ok_or_else(|| {
                    EngineError::store(format!("dangling public model {}", model_id))
                })?;
                Ok(Some(ModelIdentity {
                    model_id: model_id.clone(),
                    classes: record.classes.clone(),
                }))
            }
            None => Ok(None),
        }
    }

    fn register_model(
        &self,
        user_id: &str,
        name: &str,
        classes: &[String],
    ) -> Result<ModelIdentity> {
        if classes.len() < 2 {
            return Err(EngineError::invalid_classes(
                "a model needs at least 2 classes",
            ));
        }

        let mut state = self.state.write();

        let name_taken = state
            .bindings
            .iter()
            .any(|b| b.user_id == user_id && b.name == name)
            || state.public_models.contains_key(name);
        if name_taken {
            return Err(EngineError::ModelNameExists {
                name: name.to_string(),
            });
        }

        // classes are stored sorted; their order is frozen from here on
        let mut sorted: Vec<String> = classes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let model_id = model_id_for_classes(&sorted);

        state
            .models
            .entry(model_id.clone())
            .or_insert_with(|| ModelRecord {
                classes: sorted.clone(),
                ..Default::default()
            });
        state.bindings.push(Binding {
            user_id: user_id.to_string(),
            name: name.to_string(),
            model_id: model_id.clone(),
            request_count: 0,
        });

        Ok(ModelIdentity {
            model_id,
            classes: sorted,
        })
    }

    fn increment_counters(&self, user_id: &str, model_id: &str, name_count: usize) -> Result<()> {
        let mut state = self.state.write();

        *state
            .user_request_counts
            .entry(user_id.to_string())
            .or_insert(0) += 1;

        if let Some(record) = state.models.get_mut(model_id) {
            record.request_count += 1;
            record.names_classified += name_count as u64;
        }

        if let Some(binding) = state
            .bindings
            .iter_mut()
            .find(|b| b.user_id == user_id && b.model_id == model_id)
        {
            binding.request_count += 1;
        }

        Ok(())
    }

    fn list_models(&self, user_id: &str) -> Result<ModelCatalog> {
        let state = self.state.read();

        let default_models = state
            .public_models
            .iter()
            .filter_map(|(name, model_id)| {
                state.models.get(model_id).map(|record| ModelListing {
                    name: name.clone(),
                    nationalities: record.classes.clone(),
                    request_count: record.request_count,
                })
            })
            .collect();

        let custom_models = state
            .bindings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                state.models.get(&b.model_id).map(|record| ModelListing {
                    name: b.name.clone(),
                    nationalities: record.classes.clone(),
                    request_count: b.request_count,
                })
            })
            .collect();

        Ok(ModelCatalog {
            default_models,
            custom_models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_model_id_is_order_independent() {
        let a = model_id_for_classes(&classes(&["chinese", "else"]));
        let b = model_id_for_classes(&classes(&["else", "chinese"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_model_id_ignores_duplicates_but_not_set_changes() {
        let a = model_id_for_classes(&classes(&["chinese", "else", "else"]));
        let b = model_id_for_classes(&classes(&["chinese", "else"]));
        let c = model_id_for_classes(&classes(&["chinese", "german"]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_user_binding_shadows_public_model() {
        let registry = InMemoryRegistry::new();
        // binding predates the public model taking the same name
        let custom = registry
            .register_model("user-1", "default", &classes(&["german", "greek"]))
            .unwrap();
        let public = registry.add_public_model("default", &classes(&["chinese", "else"]));

        let resolved = resolve_model(&registry, "user-1", "default").unwrap();
        assert_eq!(resolved, custom);

        // other users still get the public model
        let resolved = resolve_model(&registry, "user-2", "default").unwrap();
        assert_eq!(resolved, public);
    }

    #[test]
    fn test_same_name_different_users_are_independent() {
        let registry = InMemoryRegistry::new();
        let a = registry
            .register_model("user-1", "mine", &classes(&["chinese", "else"]))
            .unwrap();
        let b = registry
            .register_model("user-2", "mine", &classes(&["german", "greek"]))
            .unwrap();
        assert_ne!(a.model_id, b.model_id);
    }

    #[test]
    fn test_same_class_set_shares_model_id_across_users() {
        let registry = InMemoryRegistry::new();
        let a = registry
            .register_model("user-1", "one", &classes(&["chinese", "else"]))
            .unwrap();
        let b = registry
            .register_model("user-2", "two", &classes(&["else", "chinese"]))
            .unwrap();
        assert_eq!(a.model_id, b.model_id);
        assert_eq!(a.classes, b.classes);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = InMemoryRegistry::new();
        registry
            .register_model("user-1", "mine", &classes(&["chinese", "else"]))
            .unwrap();
        let err = registry
            .register_model("user-1", "mine", &classes(&["german", "greek"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "MODEL_NAME_EXISTS");
    }

    #[test]
    fn test_name_clashing_with_public_model_rejected() {
        let registry = InMemoryRegistry::new();
        registry.add_public_model("default", &classes(&["chinese", "else"]));
        let err = registry
            .register_model("user-1", "default", &classes(&["german", "greek"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "MODEL_NAME_EXISTS");
    }

    #[test]
    fn test_too_few_classes_rejected() {
        let registry = InMemoryRegistry::new();
        let err = registry
            .register_model("user-1", "tiny", &classes(&["chinese"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CLASSES");
    }

    #[test]
    fn test_unknown_model_fails_resolution() {
        let registry = InMemoryRegistry::new();
        let err = resolve_model(&registry, "user-1", "ghost").unwrap_err();
        assert_eq!(err.error_code(), "MODEL_DOES_NOT_EXIST");
    }

    #[test]
    fn test_counters_increment() {
        let registry = InMemoryRegistry::new();
        let identity = registry
            .register_model("user-1", "mine", &classes(&["chinese", "else"]))
            .unwrap();

        registry
            .increment_counters("user-1", &identity.model_id, 7)
            .unwrap();
        registry
            .increment_counters("user-1", &identity.model_id, 3)
            .unwrap();

        assert_eq!(registry.user_request_count("user-1"), 2);

        let catalog = registry.list_models("user-1").unwrap();
        assert_eq!(catalog.custom_models.len(), 1);
        assert_eq!(catalog.custom_models[0].request_count, 2);
    }

    #[test]
    fn test_list_models_includes_public_catalog() {
        let registry = InMemoryRegistry::new();
        registry.add_public_model("default", &classes(&["chinese", "else"]));
        registry
            .register_model("user-1", "mine", &classes(&["german", "greek"]))
            .unwrap();

        let catalog = registry.list_models("user-1").unwrap();
        assert_eq!(catalog.default_models.len(), 1);
        assert_eq!(catalog.custom_models.len(), 1);

        // another user sees the public catalog but no custom bindings
        let catalog = registry.list_models("user-2").unwrap();
        assert_eq!(catalog.default_models.len(), 1);
        assert!(catalog.custom_models.is_empty());
    }
}
