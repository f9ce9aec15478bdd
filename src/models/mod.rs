// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Data models for the application.

pub mod achievement;
pub mod quest;
pub mod user;

pub use achievement::{AchievementDef, Threshold};
pub use quest::{ActivityType, DistanceStatKey, Environment, QuestStatus, QuestTemplate, UserQuest};
pub use user::UserAccount;
