//! REST API layer for the classification server
//!
//! This module provides the HTTP endpoints for name classification, model
//! management, and operational monitoring, plus the middleware wiring for
//! authentication and request logging.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

use crate::config::Config;
use crate::error::Result;
use crate::inference::ClassificationEngine;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing::info;

/// API server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ClassificationEngine>,
    pub config: Config,
}

/// Start the API server
pub async fn start_server(config: Config, engine: Arc<ClassificationEngine>) -> Result<()> {
    let bind_address = config.server_address();
    info!("Starting API server on {}", bind_address);

    let app_state = AppState {
        engine: Arc::clone(&engine),
        config: config.clone(),
    };

    HttpServer::new(move || {
        let cors = if config.server.enable_cors {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            Cors::default()
        };

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::logging::RequestLogging)
            .wrap(middleware::auth::BearerAuth::new(
                config.server.api_tokens.clone(),
            ))
            .configure(routes::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

pub use handlers::*;
pub use types::*;
