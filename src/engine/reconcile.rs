// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Stats reconciliation: the deltas a completed quest applies to the
//! user's account record.
//!
//! These functions are pure state transforms over an in-memory
//! [`UserAccount`]; the database layer runs them inside a Firestore
//! transaction so racing completions retry instead of losing updates.
//!
//! `apply_quest_completion` is deliberately NOT idempotent: applying the
//! same completion twice doubles the XP. Replay protection lives at the
//! quest-instance layer, which refuses to complete an instance twice.

use chrono::NaiveDate;

use crate::engine::goal;
use crate::engine::level::{level_from_xp, title_from_level};
use crate::models::quest::DistanceStatKey;
use crate::models::{ActivityType, QuestTemplate, UserAccount};
use crate::time_utils::{iso_date, week_start_iso, yesterday_iso};

/// Daily active-minutes goal that feeds `activeDaysStreak`.
const ACTIVE_MINUTES_GOAL: f64 = 30.0;

/// Apply a quest completion's stat deltas to the account.
///
/// Covers XP, calories, level/title, the weekly counter, the lifetime
/// counter, the logged-day streak, and the activity-specific side stats
/// (distance totals for Active quests, active minutes for Timed ones).
pub fn apply_quest_completion(account: &mut UserAccount, quest: &QuestTemplate, today: NaiveDate) {
    account.xp += quest.xp;
    account.calories_burned += quest.calories;
    account.level = level_from_xp(account.xp);
    account.title = title_from_level(account.level).to_string();

    // Weekly counter rolls over when the week-start marker changes
    let week_start = week_start_iso(today);
    if account.last_quest_reset != week_start {
        account.quests_this_week = 1;
    } else {
        account.quests_this_week += 1;
    }
    account.last_quest_reset = week_start;

    account.quests += 1;

    apply_logged_day(account, today);

    match quest.activity_type {
        ActivityType::Active => apply_distance_stat(account, quest),
        ActivityType::Timed => apply_active_minutes(account, &quest.goal, today),
        ActivityType::Reps | ActivityType::Wellness => {}
    }
}

/// Logged-day streak: one increment per calendar day with a completion.
///
/// Same day: no-op. Exactly yesterday: extend the streak. Anything older
/// (or a fresh account): reset to 1.
pub fn apply_logged_day(account: &mut UserAccount, today: NaiveDate) {
    let today_iso = iso_date(today);
    if account.last_logged_day == today_iso {
        return;
    }
    if account.last_logged_day == yesterday_iso(today) {
        account.logged_days += 1;
    } else {
        account.logged_days = 1;
    }
    account.last_logged_day = today_iso;
}

/// Add a completed Active quest's kilometers to the matching distance total.
fn apply_distance_stat(account: &mut UserAccount, quest: &QuestTemplate) {
    let km = goal::distance_goal_km(&quest.goal);
    if km <= 0.0 {
        return;
    }
    match quest.distance_stat() {
        Some(DistanceStatKey::Running) => account.running_distance += km,
        Some(DistanceStatKey::Cycling) => account.cycling_distance += km,
        None => {}
    }
}

/// Accumulate a Timed quest's minutes and maintain the active-day streak.
///
/// A new day carries the streak only if yesterday's total reached the
/// 30-minute goal; within a day, the streak bumps once when the running
/// total first crosses it.
pub fn apply_active_minutes(account: &mut UserAccount, goal_str: &str, today: NaiveDate) {
    let minutes = goal::active_minutes_goal(goal_str);
    if minutes == 0.0 {
        return;
    }

    let today_iso = iso_date(today);
    if account.last_active_day != today_iso {
        account.active_days_streak = if account.active_minutes_today >= ACTIVE_MINUTES_GOAL {
            account.active_days_streak + 1
        } else {
            0
        };
        account.active_minutes_today = minutes;
    } else {
        let previous = account.active_minutes_today;
        account.active_minutes_today += minutes;
        if account.active_minutes_today >= ACTIVE_MINUTES_GOAL && previous < ACTIVE_MINUTES_GOAL {
            account.active_days_streak += 1;
        }
    }
    account.last_active_day = today_iso;
}

/// Record a pedometer sample: the device's cumulative step count for today.
///
/// Same-day samples contribute their delta to `totalSteps`; a day rollover
/// starts `stepsToday` fresh. A step sample counts as engagement, so the
/// check-in streak is maintained first; `lastActive` is the shared day
/// marker and is only ever written by [`apply_check_in`].
pub fn apply_step_sample(account: &mut UserAccount, steps_today: u32, today: NaiveDate) {
    let same_day = account.last_active == iso_date(today);
    apply_check_in(account, today);

    if same_day {
        let delta = steps_today.saturating_sub(account.steps_today);
        account.total_steps += delta;
        account.steps_today = account.steps_today.max(steps_today);
    } else {
        account.total_steps += steps_today;
        account.steps_today = steps_today;
    }
}

/// Daily check-in: maintains the general engagement streak.
pub fn apply_check_in(account: &mut UserAccount, today: NaiveDate) {
    let today_iso = iso_date(today);
    if account.last_active == today_iso {
        return;
    }
    if account.last_active == yesterday_iso(today) {
        account.streak += 1;
    } else {
        account.streak = 1;
    }
    account.last_active = today_iso;
}

/// The transient banner shown after a completion.
pub fn completion_banner(quest: &QuestTemplate) -> String {
    format!("+{} XP · {} kcal burned", quest.xp, quest.calories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Environment;

    fn quest(activity_type: ActivityType, goal: &str, xp: u32, calories: u32) -> QuestTemplate {
        QuestTemplate {
            id: "q1".to_string(),
            title: "Morning Run".to_string(),
            category: String::new(),
            environment: Environment::Outdoor,
            activity_type,
            fitness_category: String::new(),
            xp,
            calories,
            icon: String::new(),
            status: "active".to_string(),
            goal: goal.to_string(),
            distance_stat_key: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_completion_applies_xp_calories_and_counts() {
        let mut account = UserAccount::new("u1", "now");
        let q = quest(ActivityType::Wellness, "Sleep 8 hours", 120, 40);
        let today = d(2026, 1, 7);

        apply_quest_completion(&mut account, &q, today);

        assert_eq!(account.xp, 120);
        assert_eq!(account.calories_burned, 40);
        assert_eq!(account.level, 2);
        assert_eq!(account.title, "Beginner");
        assert_eq!(account.quests, 1);
        assert_eq!(account.quests_this_week, 1);
        assert_eq!(account.logged_days, 1);
    }

    #[test]
    fn test_reconciler_is_not_idempotent_by_design() {
        // Replay protection belongs to the instance layer; the pure
        // reconciler doubles XP when applied twice.
        let mut account = UserAccount::new("u1", "now");
        let q = quest(ActivityType::Wellness, "Stretch", 100, 10);
        let today = d(2026, 1, 7);

        apply_quest_completion(&mut account, &q, today);
        apply_quest_completion(&mut account, &q, today);

        assert_eq!(account.xp, 200);
        assert_eq!(account.quests, 2);
    }

    #[test]
    fn test_weekly_counter_resets_on_stale_marker() {
        let mut account = UserAccount::new("u1", "now");
        account.quests_this_week = 9;
        account.last_quest_reset = "2025-12-22".to_string(); // two Mondays ago

        // Wednesday 2026-01-07; the current week started Monday 2026-01-05
        apply_quest_completion(
            &mut account,
            &quest(ActivityType::Wellness, "Hydrate", 10, 0),
            d(2026, 1, 7),
        );

        assert_eq!(account.quests_this_week, 1);
        assert_eq!(account.last_quest_reset, "2026-01-05");
    }

    #[test]
    fn test_weekly_counter_increments_within_week() {
        let mut account = UserAccount::new("u1", "now");
        account.quests_this_week = 3;
        account.last_quest_reset = "2026-01-05".to_string();

        apply_quest_completion(
            &mut account,
            &quest(ActivityType::Wellness, "Hydrate", 10, 0),
            d(2026, 1, 7),
        );

        assert_eq!(account.quests_this_week, 4);
    }

    #[test]
    fn test_level_crosses_into_recurrence() {
        let mut account = UserAccount::new("u1", "now");
        account.xp = 2650;
        account.level = 9;

        apply_quest_completion(
            &mut account,
            &quest(ActivityType::Wellness, "Meditate", 100, 0),
            d(2026, 1, 7),
        );

        assert_eq!(account.xp, 2750);
        assert_eq!(account.level, 11);
        assert_eq!(account.title, "Adventurer");
    }

    #[test]
    fn test_logged_days_same_day_is_noop() {
        let mut account = UserAccount::new("u1", "now");
        account.logged_days = 4;
        account.last_logged_day = "2026-01-07".to_string();

        apply_logged_day(&mut account, d(2026, 1, 7));

        assert_eq!(account.logged_days, 4);
    }

    #[test]
    fn test_logged_days_yesterday_extends_streak() {
        let mut account = UserAccount::new("u1", "now");
        account.logged_days = 4;
        account.last_logged_day = "2026-01-06".to_string();

        apply_logged_day(&mut account, d(2026, 1, 7));

        assert_eq!(account.logged_days, 5);
        assert_eq!(account.last_logged_day, "2026-01-07");
    }

    #[test]
    fn test_logged_days_gap_resets_streak() {
        let mut account = UserAccount::new("u1", "now");
        account.logged_days = 9;
        account.last_logged_day = "2026-01-03".to_string();

        apply_logged_day(&mut account, d(2026, 1, 7));

        assert_eq!(account.logged_days, 1);
    }

    #[test]
    fn test_run_quest_feeds_running_distance() {
        let mut account = UserAccount::new("u1", "now");
        let q = quest(ActivityType::Active, "2km", 200, 200);

        apply_quest_completion(&mut account, &q, d(2026, 1, 7));

        assert_eq!(account.running_distance, 2.0);
        assert_eq!(account.cycling_distance, 0.0);
    }

    #[test]
    fn test_step_goal_feeds_distance_via_km_conversion() {
        let mut account = UserAccount::new("u1", "now");
        let mut q = quest(ActivityType::Active, "5000", 100, 250);
        q.title = "Run errands on foot".to_string();

        apply_quest_completion(&mut account, &q, d(2026, 1, 7));

        assert!((account.running_distance - 3.81).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_distance_stat_key_routes_cycling() {
        let mut account = UserAccount::new("u1", "now");
        let mut q = quest(ActivityType::Active, "5km", 250, 300);
        q.distance_stat_key = Some(DistanceStatKey::Cycling);

        apply_quest_completion(&mut account, &q, d(2026, 1, 7));

        assert_eq!(account.cycling_distance, 5.0);
        assert_eq!(account.running_distance, 0.0);
    }

    #[test]
    fn test_active_minutes_accumulate_and_bump_streak_once() {
        let mut account = UserAccount::new("u1", "now");
        account.last_active_day = "2026-01-07".to_string();
        account.active_minutes_today = 25.0;
        account.active_days_streak = 2;

        apply_active_minutes(&mut account, "10:00", d(2026, 1, 7));
        assert_eq!(account.active_minutes_today, 35.0);
        assert_eq!(account.active_days_streak, 3);

        // Already past the goal: no second bump today
        apply_active_minutes(&mut account, "10:00", d(2026, 1, 7));
        assert_eq!(account.active_days_streak, 3);
    }

    #[test]
    fn test_active_minutes_new_day_checks_yesterday_total() {
        let mut account = UserAccount::new("u1", "now");
        account.last_active_day = "2026-01-06".to_string();
        account.active_minutes_today = 45.0;
        account.active_days_streak = 2;

        apply_active_minutes(&mut account, "5:00", d(2026, 1, 7));

        assert_eq!(account.active_days_streak, 3);
        assert_eq!(account.active_minutes_today, 5.0);

        // Another rollover where yesterday fell short resets the streak
        account.last_active_day = "2026-01-07".to_string();
        apply_active_minutes(&mut account, "5:00", d(2026, 1, 8));
        assert_eq!(account.active_days_streak, 0);
    }

    #[test]
    fn test_active_minutes_skips_bare_second_goals() {
        let mut account = UserAccount::new("u1", "now");
        apply_active_minutes(&mut account, "45", d(2026, 1, 7));
        assert_eq!(account.active_minutes_today, 0.0);
        assert_eq!(account.last_active_day, "");
    }

    #[test]
    fn test_step_sample_same_day_accumulates_delta() {
        let mut account = UserAccount::new("u1", "now");
        account.last_active = "2026-01-07".to_string();
        account.steps_today = 3000;
        account.total_steps = 50_000;

        apply_step_sample(&mut account, 4200, d(2026, 1, 7));

        assert_eq!(account.steps_today, 4200);
        assert_eq!(account.total_steps, 51_200);
    }

    #[test]
    fn test_step_sample_day_rollover_resets_today() {
        let mut account = UserAccount::new("u1", "now");
        account.last_active = "2026-01-06".to_string();
        account.streak = 3;
        account.steps_today = 9000;
        account.total_steps = 50_000;

        apply_step_sample(&mut account, 500, d(2026, 1, 7));

        assert_eq!(account.steps_today, 500);
        assert_eq!(account.total_steps, 50_500);
        assert_eq!(account.last_active, "2026-01-07");
        // The first sample of the day also counts as the day's check-in
        assert_eq!(account.streak, 4);
    }

    #[test]
    fn test_check_in_streak() {
        let mut account = UserAccount::new("u1", "now");
        account.streak = 6;
        account.last_active = "2026-01-06".to_string();

        apply_check_in(&mut account, d(2026, 1, 7));
        assert_eq!(account.streak, 7);

        // Second check-in the same day is a no-op
        apply_check_in(&mut account, d(2026, 1, 7));
        assert_eq!(account.streak, 7);

        // A gap resets to 1
        account.last_active = "2026-01-01".to_string();
        apply_check_in(&mut account, d(2026, 1, 7));
        assert_eq!(account.streak, 1);
    }

    #[test]
    fn test_completion_banner_format() {
        let q = quest(ActivityType::Reps, "50", 150, 16);
        assert_eq!(completion_banner(&q), "+150 XP · 16 kcal burned");
    }
}
