//! Achievement definition reference data.

use serde::{Deserialize, Serialize};

/// Threshold an achievement watches: a numeric floor or a boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Flag(bool),
    Numeric(f64),
}

/// Master achievement definition, immutable reference data.
///
/// Stored at: `masterAchievements/{id}`. `stat_key` names the user-stat
/// field the achievement watches. The `xp` bonus is carried but inert:
/// unlocks never grant XP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub stat_key: String,
    pub value: Threshold,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub xp: u32,
}
