// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

use fitquest_engine::config::Config;
use fitquest_engine::db::FirestoreDb;
use fitquest_engine::routes::create_router;
use fitquest_engine::services::QuestService;
use fitquest_engine::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let quest_service = QuestService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        quest_service,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db().await;
    let quest_service = QuestService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        quest_service,
    });

    (create_router(state.clone()), state)
}
