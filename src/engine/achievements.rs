// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Achievement awarding: compare user stats against the master
//! definitions and unlock newly qualifying badges.
//!
//! Unlocks are monotonic: once a title is true it is never re-evaluated
//! and never revoked. The `xp` bonus on definitions is inert.

use crate::models::user::StatValue;
use crate::models::{AchievementDef, Threshold, UserAccount};

/// Evaluate all definitions against the account and unlock newly
/// qualifying ones in place. Returns the titles unlocked by this pass.
pub fn award(account: &mut UserAccount, defs: &[AchievementDef]) -> Vec<String> {
    let mut newly_unlocked = Vec::new();

    for def in defs {
        if account.achievements.get(&def.title).copied().unwrap_or(false) {
            continue;
        }
        let Some(stat) = account.stat_value(&def.stat_key) else {
            continue;
        };
        let qualifies = match (def.value, stat) {
            (Threshold::Numeric(threshold), StatValue::Number(value)) => value >= threshold,
            (Threshold::Flag(true), StatValue::Flag(true)) => true,
            _ => false,
        };
        if qualifies {
            account.achievements.insert(def.title.clone(), true);
            newly_unlocked.push(def.title.clone());
        }
    }

    newly_unlocked
}
