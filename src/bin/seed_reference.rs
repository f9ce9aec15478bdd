// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Seed the reference collections (quest templates and master
//! achievements) into Firestore. Intended for fresh environments and
//! the local emulator.

use fitquest_engine::config::Config;
use fitquest_engine::db::FirestoreDb;
use fitquest_engine::services::seed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = Config::from_env().expect("Failed to load configuration");

    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    seed::seed_reference_data(&db).await?;

    tracing::info!("Reference data seeded");
    Ok(())
}
