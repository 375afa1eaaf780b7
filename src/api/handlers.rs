//! HTTP request handlers for API endpoints
//!
//! This module contains the actual handler functions that process HTTP
//! requests and return appropriate responses for each endpoint.

use super::middleware::auth::AuthenticatedUser;
use super::types::*;
use super::AppState;
use crate::error::{EngineError, Result};
use crate::inference::ClassificationRequest;
use crate::utils::validate_model_name;
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Handler for POST /v1/classify
///
/// The response maps each input name to its prediction. Duplicate input
/// names collapse into one key; the last occurrence wins.
pub async fn classify(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<ClassifyRequest>,
) -> Result<HttpResponse> {
    info!(
        model = %request.model_name,
        names = request.names.len(),
        "Processing classification request"
    );

    validate_model_name(&request.model_name)?;
    if request.names.is_empty() {
        return Err(EngineError::invalid_request("Names list cannot be empty"));
    }

    let classification = ClassificationRequest {
        model_name: request.model_name.clone(),
        names: request.names.clone(),
        get_distribution: request.get_distribution,
    };

    // inference is CPU-bound; keep it off the actix workers
    let engine = Arc::clone(&data.engine);
    let user_id = user.0;
    let predictions = web::block(move || engine.classify(&user_id, &classification))
        .await
        .map_err(|e| EngineError::processing(format!("Worker pool failure: {}", e)))??;

    let mut body = serde_json::Map::new();
    for (name, prediction) in request.names.iter().zip(predictions) {
        body.insert(name.clone(), serde_json::to_value(prediction)?);
    }

    Ok(HttpResponse::Ok().json(serde_json::Value::Object(body)))
}

/// Handler for POST /v1/models
pub async fn register_model(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<RegisterModelRequest>,
) -> Result<HttpResponse> {
    info!(name = %request.name, "Registering custom model");

    validate_model_name(&request.name)?;
    let identity = data
        .engine
        .register_model(&user.0, &request.name, &request.nationalities)?;

    Ok(HttpResponse::Created().json(RegisterModelResponse {
        name: request.name.clone(),
        nationalities: identity.classes,
        model_id: identity.model_id,
    }))
}

/// Handler for GET /v1/models
pub async fn list_models(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let catalog = data.engine.list_models(&user.0)?;
    Ok(HttpResponse::Ok().json(catalog))
}

/// Handler for GET /health
pub async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = data.engine.stats();

    let mut details = std::collections::HashMap::new();
    details.insert("total_requests".to_string(), json!(stats.total_requests));
    details.insert(
        "names_classified".to_string(),
        json!(stats.names_classified),
    );
    details.insert(
        "avg_inference_time_ms".to_string(),
        json!(stats.avg_inference_time_ms),
    );

    let status = if data.engine.is_healthy() {
        "healthy"
    } else {
        "unhealthy"
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        details,
    }))
}

/// Handler for GET /metrics (Prometheus metrics)
pub async fn metrics(data: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = data.engine.stats();

    let metrics_text = format!(
        "# HELP onoma_infer_requests_total Total number of requests\n\
         # TYPE onoma_infer_requests_total counter\n\
         onoma_infer_requests_total {}\n\
         \n\
         # HELP onoma_infer_successful_requests_total Total number of successful requests\n\
         # TYPE onoma_infer_successful_requests_total counter\n\
         onoma_infer_successful_requests_total {}\n\
         \n\
         # HELP onoma_infer_failed_requests_total Total number of failed requests\n\
         # TYPE onoma_infer_failed_requests_total counter\n\
         onoma_infer_failed_requests_total {}\n\
         \n\
         # HELP onoma_infer_names_classified_total Total number of names classified\n\
         # TYPE onoma_infer_names_classified_total counter\n\
         onoma_infer_names_classified_total {}\n\
         \n\
         # HELP onoma_infer_avg_inference_time_ms Average inference time in milliseconds\n\
         # TYPE onoma_infer_avg_inference_time_ms gauge\n\
         onoma_infer_avg_inference_time_ms {}\n",
        stats.total_requests,
        stats.successful_requests,
        stats.failed_requests,
        stats.names_classified,
        stats.avg_inference_time_ms,
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(metrics_text))
}

/// Default 404 handler
pub async fn not_found() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(json!({
        "errorCode": "NOT_FOUND",
        "message": "The requested endpoint was not found"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactStore, ModelHyperparams};
    use crate::config::Config;
    use crate::inference::ClassificationEngine;
    use crate::quota::InMemoryQuotaStore;
    use crate::registry::InMemoryRegistry;
    use actix_web::{test, web, App};

    struct EmptyArtifacts;
    impl ArtifactStore for EmptyArtifacts {
        fn get_weights(&self, _: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn get_hyperparams(&self, _: &str) -> Result<Option<ModelHyperparams>> {
            Ok(None)
        }
    }

    fn test_state() -> AppState {
        let mut config = Config::default();
        config.inference.device = "cpu".to_string();

        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_public_model("default", &["chinese".to_string(), "else".to_string()]);

        let engine = ClassificationEngine::new(
            config.clone(),
            registry,
            Arc::new(InMemoryQuotaStore::new()),
            Arc::new(EmptyArtifacts),
        )
        .unwrap();

        AppState {
            engine: Arc::new(engine),
            config,
        }
    }

    // with no tokens configured the auth middleware runs every request as
    // the anonymous user, which is all these handler tests need
    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_state()))
                    .wrap(super::super::middleware::auth::BearerAuth::new(
                        Default::default(),
                    ))
                    .configure(super::super::routes::configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_classify_unknown_model_is_404() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/v1/classify")
            .set_json(json!({
                "modelName": "ghost",
                "names": ["cixin liu"]
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errorCode"], "MODEL_DOES_NOT_EXIST");
    }

    #[actix_web::test]
    async fn test_classify_empty_names_is_400() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/v1/classify")
            .set_json(json!({
                "modelName": "default",
                "names": []
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_register_and_list_models() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/v1/models")
            .set_json(json!({
                "name": "mine",
                "nationalities": ["german", "greek"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::get().uri("/v1/models").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["defaultModels"].as_array().unwrap().len(), 1);
        assert_eq!(json["customModels"][0]["name"], "mine");
    }

    #[actix_web::test]
    async fn test_register_duplicate_name_is_409() {
        let app = test_app!();
        let body = json!({
            "name": "mine",
            "nationalities": ["german", "greek"]
        });

        let req = test::TestRequest::post()
            .uri("/v1/models")
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/v1/models")
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 409);
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_metrics_endpoint() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("onoma_infer_requests_total"));
    }

    #[actix_web::test]
    async fn test_unknown_route_is_404() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
