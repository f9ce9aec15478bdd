// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Parsing of quest goal strings into numeric targets.
//!
//! Goals are free text whose unit depends on the activity type: "5km" or a
//! bare step count for Active quests, a rep count for Reps quests, "mm:ss"
//! or bare seconds for Timed quests. Wellness goals are opaque.
//!
//! Malformed input parses to zero rather than failing: a quest with an
//! unparseable goal simply never completes. Two different step-to-distance
//! conversions exist in the legacy data paths and are kept distinct:
//! 0.000762 km/step for stat accounting and 0.762 m/step for route-radius
//! estimation.

use crate::models::ActivityType;

/// Kilometers credited per step in distance-stat accounting.
const KM_PER_STEP: f64 = 0.000_762;

/// Meters per step used when sizing a route search radius.
const METERS_PER_STEP: f64 = 0.762;

/// Reps performed per completed set.
pub const REPS_PER_SET: u32 = 10;

/// A quest goal resolved against its activity type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalTarget {
    /// Kilometers to cover (Active)
    DistanceKm(f64),
    /// Repetitions to perform (Reps)
    Reps(u32),
    /// Seconds to hold (Timed)
    Seconds(u32),
    /// Completion is a manual user action (Wellness)
    Manual,
}

/// Resolve a goal string for the given activity type.
pub fn parse_goal(goal: &str, activity_type: ActivityType) -> GoalTarget {
    match activity_type {
        ActivityType::Active => GoalTarget::DistanceKm(distance_goal_km(goal)),
        ActivityType::Reps => GoalTarget::Reps(reps_goal(goal)),
        ActivityType::Timed => GoalTarget::Seconds(duration_goal_seconds(goal)),
        ActivityType::Wellness => GoalTarget::Manual,
    }
}

/// Distance goal in kilometers, for stat accounting.
///
/// "5km" parses as kilometers; anything else is treated as a step count
/// and converted at 0.000762 km/step.
pub fn distance_goal_km(goal: &str) -> f64 {
    let lowered = goal.to_lowercase();
    if let Some(km) = lowered.strip_suffix("km") {
        return km.trim().parse::<f64>().unwrap_or(0.0);
    }
    leading_number(&lowered) * KM_PER_STEP
}

/// Distance goal in meters, for route-radius estimation.
///
/// Uses the coarser legacy conversion of 0.762 m/step, rounded.
pub fn route_goal_meters(goal: &str) -> f64 {
    let lowered = goal.to_lowercase();
    if let Some(km) = lowered.strip_suffix("km") {
        return km.trim().parse::<f64>().unwrap_or(0.0) * 1000.0;
    }
    (leading_number(&lowered) * METERS_PER_STEP).round()
}

/// Rep goal: integer parse of the leading digits ("50" -> 50).
pub fn reps_goal(goal: &str) -> u32 {
    leading_digits(goal).parse().unwrap_or(0)
}

/// Timed goal in total seconds: "mm:ss" or bare seconds.
pub fn duration_goal_seconds(goal: &str) -> u32 {
    let parts: Vec<&str> = goal.trim().split(':').collect();
    if parts.len() == 2 {
        let minutes: u32 = parts[0].trim().parse().unwrap_or(0);
        let seconds: u32 = parts[1].trim().parse().unwrap_or(0);
        return minutes * 60 + seconds;
    }
    goal.trim().parse().unwrap_or(0)
}

/// Timed goal in fractional minutes, for active-minutes accounting.
///
/// Only "mm:ss" goals count; a goal without a colon yields zero and the
/// active-minutes update is skipped.
pub fn active_minutes_goal(goal: &str) -> f64 {
    if !goal.contains(':') {
        return 0.0;
    }
    let parts: Vec<&str> = goal.trim().split(':').collect();
    if parts.len() != 2 {
        return 0.0;
    }
    let minutes: f64 = parts[0].trim().parse().unwrap_or(0.0);
    let seconds: f64 = parts[1].trim().parse().unwrap_or(0.0);
    minutes + seconds / 60.0
}

/// Leading decimal digits of a goal string ("5,000 Steps" -> "5").
fn leading_digits(s: &str) -> &str {
    let trimmed = s.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(trimmed.len(), |(i, _)| i);
    &trimmed[..end]
}

fn leading_number(s: &str) -> f64 {
    leading_digits(s).parse().unwrap_or(0.0)
}
