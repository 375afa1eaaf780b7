//! Main entry point for the classification server

use onoma_infer::{
    api::start_server,
    config::Config,
    error::Result,
    init_engine,
    utils::{format_duration, init_logging},
    VERSION,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize logging
    if let Err(e) = init_logging(&config.logging.level, &config.logging.format) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    info!("Starting onoma-infer v{} with configuration:", VERSION);
    info!("  Server: {}:{}", config.server.host, config.server.port);
    info!("  Device: {}", config.inference.device);
    info!("  Sub-batch size: {}", config.inference.batch_size);
    info!(
        "  Limits: {} names/request, {} names/day",
        config.limits.max_names_per_request, config.limits.daily_quota
    );
    info!("  Artifact root: {}", config.artifacts.root.display());

    if config.auth_enabled() {
        info!("  Authentication: enabled");
    } else {
        warn!("  Authentication: disabled (not recommended for production)");
    }

    // Initialize the classification engine
    info!("Initializing classification engine...");
    let start_time = Instant::now();

    let engine = match init_engine(&config) {
        Ok(engine) => {
            info!(
                "Classification engine initialized in {}",
                format_duration(start_time.elapsed())
            );
            Arc::new(engine)
        }
        Err(e) => {
            error!("Failed to initialize classification engine: {}", e);
            return Err(e);
        }
    };

    // Set up graceful shutdown
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received shutdown signal, exiting");
        std::process::exit(0);
    });

    // Start the HTTP server
    info!("Starting HTTP server...");
    if let Err(e) = start_server(config, engine).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
