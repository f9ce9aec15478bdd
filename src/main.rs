// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! FitQuest Engine API Server
//!
//! Turns raw activity signals into quest completions and durable
//! account-state changes against Firestore.

use fitquest_engine::{
    config::Config, db::FirestoreDb, services::QuestService, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FitQuest Engine API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Quest lifecycle service with its in-memory evaluator sessions
    let quest_service = QuestService::new(db.clone());
    tracing::info!("Quest service initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        quest_service,
    });

    // Build router
    let app = fitquest_engine::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitquest_engine=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
