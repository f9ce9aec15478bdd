// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Reference-data seeding: sample quest templates and the master
//! achievement table. Used by the `seed-reference` binary for fresh
//! environments and by the integration tests.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{
    AchievementDef, ActivityType, DistanceStatKey, Environment, QuestTemplate, Threshold,
};

fn quest(
    id: &str,
    title: &str,
    category: &str,
    environment: Environment,
    activity_type: ActivityType,
    fitness_category: &str,
    xp: u32,
    calories: u32,
    icon: &str,
    goal: &str,
    distance_stat_key: Option<DistanceStatKey>,
) -> QuestTemplate {
    QuestTemplate {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        environment,
        activity_type,
        fitness_category: fitness_category.to_string(),
        xp,
        calories,
        icon: icon.to_string(),
        status: "active".to_string(),
        goal: goal.to_string(),
        distance_stat_key,
    }
}

/// The starter quest catalog.
pub fn sample_quests() -> Vec<QuestTemplate> {
    use ActivityType::*;
    use Environment::*;

    vec![
        quest(
            "run_2km", "Run 2km", "Cardio Challenge", Outdoor, Active, "Cardio",
            200, 200, "running", "2km", Some(DistanceStatKey::Running),
        ),
        quest(
            "run_5km", "Run 5km", "Cardio Challenge", Outdoor, Active, "Cardio",
            300, 500, "running", "5km", Some(DistanceStatKey::Running),
        ),
        quest(
            "cycle_5km", "Cycle 5km", "Cardio Challenge", Outdoor, Active, "Cardio",
            250, 300, "bicycle", "5km", Some(DistanceStatKey::Cycling),
        ),
        quest(
            "walk_5000", "Walk 5,000 Steps", "Cardio Challenge", Outdoor, Active, "Cardio",
            100, 250, "shoe-prints", "5000", None,
        ),
        quest(
            "walk_10000", "Walk 10,000 Steps", "Cardio Challenge", Outdoor, Active, "Cardio",
            150, 500, "shoe-prints", "10000", None,
        ),
        quest(
            "jump_rope_100", "Jump Rope 100 Times", "Cardio Challenge", Any, Reps, "Cardio",
            180, 60, "dumbbell", "100", None,
        ),
        quest(
            "squats_50", "Do 50 Squats", "Strength Challenge", Indoor, Reps, "Strength",
            150, 16, "dumbbell", "50", None,
        ),
        quest(
            "pushups_30", "Push-ups 30 Times", "Strength Challenge", Indoor, Reps, "Strength",
            170, 9, "hand-rock", "30", None,
        ),
        quest(
            "lunges_100", "Do 100 Lunges", "Strength Challenge", Indoor, Reps, "Strength",
            180, 35, "dumbbell", "100", None,
        ),
        quest(
            "plank_10s", "Plank for 10 Seconds", "Core Challenge", Indoor, Timed, "Strength",
            120, 5, "stopwatch", "0:10", None,
        ),
        quest(
            "meditate_10m", "Meditate for 10 Minutes", "Mindfulness Challenge", Indoor, Timed,
            "Mindfulness", 90, 3, "om", "10:00", None,
        ),
        quest(
            "water_2l", "Drink 2L of Water", "Health Challenge", Indoor, Wellness, "Health",
            50, 0, "tint", "2L", None,
        ),
        quest(
            "sleep_8h", "Sleep 8 Hours", "Wellness Challenge", Indoor, Wellness, "Health",
            80, 0, "bed", "8h", None,
        ),
    ]
}

fn achievement(
    id: &str,
    title: &str,
    description: &str,
    stat_key: &str,
    value: Threshold,
    icon: &str,
    xp: u32,
) -> AchievementDef {
    AchievementDef {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        stat_key: stat_key.to_string(),
        value,
        icon: icon.to_string(),
        xp,
    }
}

/// The master achievement table.
pub fn sample_achievements() -> Vec<AchievementDef> {
    vec![
        achievement(
            "walk_10k", "Step Master", "Walk 10,000 steps in a single day",
            "stepsToday", Threshold::Numeric(10_000.0), "shoe-prints", 100,
        ),
        achievement(
            "complete_5_quests_week", "Quest Grinder", "Complete 5 quests in a week",
            "questsThisWeek", Threshold::Numeric(5.0), "tasks", 150,
        ),
        achievement(
            "complete_10_quests_total", "Rising Hero", "Complete 10 total quests",
            "quests", Threshold::Numeric(10.0), "medal", 200,
        ),
        achievement(
            "streak_7_days", "Consistency Champ", "Maintain a 7-day streak",
            "streak", Threshold::Numeric(7.0), "calendar-check", 200,
        ),
        achievement(
            "active_30_min", "Half-Hour Hero", "Be active for 30 minutes in a day",
            "activeMinutes", Threshold::Numeric(30.0), "clock", 80,
        ),
        achievement(
            "cycle_100km", "Pedal Power", "Cycle 100 km",
            "cyclingDistance", Threshold::Numeric(100.0), "bicycle", 120,
        ),
        achievement(
            "log_3_days", "Habit Builder", "Log workouts 3 days in a row",
            "loggedDays", Threshold::Numeric(3.0), "clipboard-list", 90,
        ),
        achievement(
            "1000_xp", "XP Milestone", "Reach 1000 XP",
            "xp", Threshold::Numeric(1000.0), "star", 0,
        ),
        achievement(
            "profile_complete", "Profile Pro", "Complete your profile setup",
            "profileComplete", Threshold::Flag(true), "user-check", 50,
        ),
    ]
}

/// Seed both reference collections.
pub async fn seed_reference_data(db: &FirestoreDb) -> Result<()> {
    let quests = sample_quests();
    db.batch_upsert_quests(&quests).await?;
    tracing::info!(count = quests.len(), "Seeded quest templates");

    let achievements = sample_achievements();
    db.batch_upsert_achievements(&achievements).await?;
    tracing::info!(count = achievements.len(), "Seeded achievement definitions");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::goal;

    #[test]
    fn test_sample_quests_have_unique_ids() {
        let quests = sample_quests();
        let mut ids: Vec<&str> = quests.iter().map(|q| q.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), quests.len());
    }

    #[test]
    fn test_measured_goals_all_parse() {
        for q in sample_quests() {
            match goal::parse_goal(&q.goal, q.activity_type) {
                goal::GoalTarget::DistanceKm(km) => {
                    assert!(km > 0.0, "quest {} has a zero distance goal", q.id)
                }
                goal::GoalTarget::Reps(reps) => {
                    assert!(reps > 0, "quest {} has a zero rep goal", q.id)
                }
                goal::GoalTarget::Seconds(secs) => {
                    assert!(secs > 0, "quest {} has a zero duration goal", q.id)
                }
                goal::GoalTarget::Manual => {
                    assert_eq!(q.activity_type, ActivityType::Wellness)
                }
            }
        }
    }

    #[test]
    fn test_achievement_stat_keys_resolve() {
        // Every seeded definition must watch a stat the account can resolve
        let account = crate::models::UserAccount::new("u1", "now");
        for def in sample_achievements() {
            assert!(
                account.stat_value(&def.stat_key).is_some(),
                "unresolvable stat key {} on {}",
                def.stat_key,
                def.id
            );
        }
    }
}
