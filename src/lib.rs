// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! FitQuest Engine: quest progression and stats reconciliation backend.
//!
//! This crate provides the backend API that turns raw activity signals
//! (location fixes, timer ticks, rep sets, manual check-offs) into quest
//! completions and durable account-state changes: XP, level, streaks,
//! weekly counters, and achievement unlocks.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::QuestService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub quest_service: QuestService,
}
