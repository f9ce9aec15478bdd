//! User account model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User account document stored in Firestore.
///
/// Stored at: `users/{userId}`. Field names keep the legacy camelCase
/// wire schema. Counters only grow except where a reset marker rolls
/// them over (`stepsToday`, `questsThisWeek`, the streak fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Opaque identity from the external auth provider (also the document ID)
    pub user_id: String,
    /// Cumulative experience points, monotonically non-decreasing
    #[serde(default)]
    pub xp: u32,
    /// Derived from `xp` via the level curve; not independently authoritative
    #[serde(default = "default_level")]
    pub level: u32,
    /// Level-band label (Beginner, Explorer, ...)
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub calories_burned: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub steps_today: u32,
    /// Lifetime quest completions
    #[serde(default)]
    pub quests: u32,
    /// Completions since the current week's Monday
    #[serde(default)]
    pub quests_this_week: u32,
    /// Consecutive days with a check-in
    #[serde(default)]
    pub streak: u32,
    /// Consecutive days reaching 30 active minutes
    #[serde(default)]
    pub active_days_streak: u32,
    /// Consecutive days with at least one quest completion
    #[serde(default)]
    pub logged_days: u32,
    #[serde(default)]
    pub active_minutes_today: f64,
    /// Kilometers accumulated from running quests
    #[serde(default)]
    pub running_distance: f64,
    /// Kilometers accumulated from cycling quests
    #[serde(default)]
    pub cycling_distance: f64,
    /// Set once profile setup finishes
    #[serde(default)]
    pub profile_complete: bool,
    /// Achievement title -> unlocked flag; entries are never unset
    #[serde(default)]
    pub achievements: BTreeMap<String, bool>,
    /// ISO date of the last check-in / step sample
    #[serde(default)]
    pub last_active: String,
    /// Week-start marker for `questsThisWeek`
    #[serde(default)]
    pub last_quest_reset: String,
    /// Day marker for `activeDaysStreak` / `activeMinutesToday`
    #[serde(default)]
    pub last_active_day: String,
    /// Day marker for `loggedDays`
    #[serde(default)]
    pub last_logged_day: String,
    /// When the account was created (RFC3339)
    #[serde(default)]
    pub created_at: String,
}

fn default_level() -> u32 {
    1
}

/// A stat value resolvable by achievement definitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Number(f64),
    Flag(bool),
}

impl UserAccount {
    /// A fresh account with zeroed stats, as written at profile setup.
    pub fn new(user_id: &str, created_at: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            xp: 0,
            level: 1,
            title: "Beginner".to_string(),
            calories_burned: 0,
            total_steps: 0,
            steps_today: 0,
            quests: 0,
            quests_this_week: 0,
            streak: 0,
            active_days_streak: 0,
            logged_days: 0,
            active_minutes_today: 0.0,
            running_distance: 0.0,
            cycling_distance: 0.0,
            profile_complete: true,
            achievements: BTreeMap::new(),
            last_active: String::new(),
            last_quest_reset: String::new(),
            last_active_day: String::new(),
            last_logged_day: String::new(),
            created_at: created_at.to_string(),
        }
    }

    /// Resolve a stat by its wire name, for achievement evaluation.
    ///
    /// Unknown keys resolve to `None` and never unlock anything.
    pub fn stat_value(&self, key: &str) -> Option<StatValue> {
        let n = |v: f64| Some(StatValue::Number(v));
        match key {
            "xp" => n(f64::from(self.xp)),
            "level" => n(f64::from(self.level)),
            "caloriesBurned" => n(f64::from(self.calories_burned)),
            "totalSteps" => n(f64::from(self.total_steps)),
            "stepsToday" => n(f64::from(self.steps_today)),
            "quests" => n(f64::from(self.quests)),
            "questsThisWeek" => n(f64::from(self.quests_this_week)),
            "streak" => n(f64::from(self.streak)),
            "activeDaysStreak" => n(f64::from(self.active_days_streak)),
            "loggedDays" => n(f64::from(self.logged_days)),
            "activeMinutes" | "activeMinutesToday" => n(self.active_minutes_today),
            "runningDistance" => n(self.running_distance),
            "cyclingDistance" => n(self.cycling_distance),
            "profileComplete" => Some(StatValue::Flag(self.profile_complete)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_zeroed() {
        let account = UserAccount::new("user-1", "2026-01-01T00:00:00Z");
        assert_eq!(account.xp, 0);
        assert_eq!(account.level, 1);
        assert_eq!(account.title, "Beginner");
        assert!(account.achievements.is_empty());
    }

    #[test]
    fn test_stat_value_known_keys() {
        let mut account = UserAccount::new("user-1", "now");
        account.quests = 12;
        account.cycling_distance = 104.5;

        assert_eq!(account.stat_value("quests"), Some(StatValue::Number(12.0)));
        assert_eq!(
            account.stat_value("cyclingDistance"),
            Some(StatValue::Number(104.5))
        );
    }

    #[test]
    fn test_stat_value_unknown_key() {
        let account = UserAccount::new("user-1", "now");
        assert_eq!(account.stat_value("favoriteColor"), None);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let account = UserAccount::new("user-1", "now");
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("caloriesBurned").is_some());
        assert!(json.get("questsThisWeek").is_some());
        assert!(json.get("lastLoggedDay").is_some());
        assert!(json.get("calories_burned").is_none());
    }
}
