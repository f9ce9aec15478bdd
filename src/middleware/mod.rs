// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Middleware modules (authentication).

pub mod auth;

pub use auth::require_auth;
