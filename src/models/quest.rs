// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Quest template and per-user quest instance models.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How a quest's progress is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    /// Distance/GPS quests (runs, cycles, step walks)
    Active,
    /// Count-based quests done in sets
    Reps,
    /// Countdown quests (planks, holds, meditation)
    Timed,
    /// Manually checked-off wellness goals
    Wellness,
}

/// Where a quest can be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Indoor,
    Outdoor,
    Any,
}

/// Which distance counter an Active quest feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceStatKey {
    Running,
    Cycling,
}

/// Quest template reference data, immutable once published.
///
/// Stored at: `quests/{questId}`. The core only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestTemplate {
    /// Document ID (not serialized into the document body)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub environment: Environment,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub fitness_category: String,
    pub xp: u32,
    pub calories: u32,
    #[serde(default)]
    pub icon: String,
    /// "active" templates are offered to users
    #[serde(default)]
    pub status: String,
    /// Free-text goal; unit depends on `activity_type`
    pub goal: String,
    /// Explicit distance-stat routing. Legacy documents lack this field
    /// and fall back to title-substring matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_stat_key: Option<DistanceStatKey>,
}

impl QuestTemplate {
    /// Which distance counter this quest feeds, if any.
    ///
    /// Prefers the explicit `distanceStatKey` field; falls back to the
    /// legacy title-substring routing for documents that predate it.
    pub fn distance_stat(&self) -> Option<DistanceStatKey> {
        if self.distance_stat_key.is_some() {
            return self.distance_stat_key;
        }
        let title = self.title.to_lowercase();
        if title.contains("cycle") {
            Some(DistanceStatKey::Cycling)
        } else if title.contains("run") {
            Some(DistanceStatKey::Running)
        } else {
            None
        }
    }
}

/// Lifecycle state of a user's accepted quest.
///
/// Transitions are forward-only and go through [`QuestStatus::transition`];
/// nothing else writes status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestStatus {
    Accepted,
    InProgress,
    Completed,
    Abandoned,
}

impl QuestStatus {
    /// Validate a lifecycle transition, returning the new status.
    ///
    /// Allowed: Accepted -> InProgress, InProgress -> Completed, and
    /// Accepted | InProgress -> Abandoned. Everything else is rejected.
    pub fn transition(self, to: QuestStatus) -> Result<QuestStatus, AppError> {
        use QuestStatus::*;
        match (self, to) {
            (Accepted, InProgress)
            | (InProgress, Completed)
            | (Accepted, Abandoned)
            | (InProgress, Abandoned) => Ok(to),
            (from, to) => Err(AppError::InvalidTransition { from, to }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Abandoned)
    }
}

/// Per-user quest acceptance record.
///
/// Stored at: `userQuests/{userId}_{questId}`. Created on acceptance,
/// deleted on abandonment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuest {
    pub user_id: String,
    pub quest_id: String,
    pub status: QuestStatus,
    /// Fraction of the goal reached, refreshed on sample observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub accepted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl UserQuest {
    pub fn accept(user_id: &str, quest_id: &str, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            quest_id: quest_id.to_string(),
            status: QuestStatus::Accepted,
            progress: None,
            accepted_at: now.to_string(),
            started_at: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert_eq!(
            QuestStatus::Accepted.transition(QuestStatus::InProgress).unwrap(),
            QuestStatus::InProgress
        );
        assert_eq!(
            QuestStatus::InProgress.transition(QuestStatus::Completed).unwrap(),
            QuestStatus::Completed
        );
        assert!(QuestStatus::Accepted.transition(QuestStatus::Abandoned).is_ok());
        assert!(QuestStatus::InProgress.transition(QuestStatus::Abandoned).is_ok());
    }

    #[test]
    fn test_rejected_transitions() {
        // No completion without starting
        assert!(QuestStatus::Accepted.transition(QuestStatus::Completed).is_err());
        // Terminal states are final
        assert!(QuestStatus::Completed.transition(QuestStatus::Abandoned).is_err());
        assert!(QuestStatus::Completed.transition(QuestStatus::InProgress).is_err());
        assert!(QuestStatus::Abandoned.transition(QuestStatus::Accepted).is_err());
        // No going backwards
        assert!(QuestStatus::InProgress.transition(QuestStatus::Accepted).is_err());
    }

    #[test]
    fn test_status_wire_format_is_kebab_case() {
        let json = serde_json::to_string(&QuestStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: QuestStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(back, QuestStatus::Accepted);
    }

    #[test]
    fn test_distance_stat_prefers_explicit_key() {
        let mut quest = QuestTemplate {
            id: "q1".to_string(),
            title: "Go for a run".to_string(),
            category: String::new(),
            environment: Environment::Outdoor,
            activity_type: ActivityType::Active,
            fitness_category: String::new(),
            xp: 100,
            calories: 50,
            icon: String::new(),
            status: "active".to_string(),
            goal: "2km".to_string(),
            distance_stat_key: Some(DistanceStatKey::Cycling),
        };
        // Explicit key wins even though the title says "run"
        assert_eq!(quest.distance_stat(), Some(DistanceStatKey::Cycling));

        quest.distance_stat_key = None;
        assert_eq!(quest.distance_stat(), Some(DistanceStatKey::Running));

        quest.title = "Morning walk".to_string();
        assert_eq!(quest.distance_stat(), None);
    }
}
