// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Services module - business logic layer.

pub mod quest;
pub mod seed;

pub use quest::{QuestService, SampleResult};
