// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CityRide API Server
//!
//! Takes taxi reservations from riders and hands them to registered drivers,
//! revealing the driver to the rider in the hour before pickup.

use cityride::{
    config::Config,
    db::{file::FileStore, Db},
    services::SystemClock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting CityRide API");

    // Pick the store backend
    let db = match &config.data_dir {
        Some(dir) => {
            let store = FileStore::open(dir)?;
            tracing::info!(path = %dir.display(), "Using file store");
            Db::new(Arc::new(store), config.store_quota_bytes)
        }
        None => {
            tracing::warn!("DATA_DIR not set, data will not survive a restart");
            Db::new(
                Arc::new(cityride::db::memory::MemoryStore::default()),
                config.store_quota_bytes,
            )
        }
    };

    if config.geoapify_api_key.is_none() {
        tracing::warn!("GEOAPIFY_API_KEY not set, geocoding will return fallbacks");
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, Arc::new(SystemClock)));

    // Build router
    let app = cityride::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cityride=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
