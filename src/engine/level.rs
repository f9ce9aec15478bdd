// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! The level curve: cumulative XP to level number and back.
//!
//! Levels 1-10 come from a fixed threshold table; past the table the
//! requirement grows by the recurrence `2700 + (n-10) * (500 + (n-10)*50)`.
//! A quirk of the curve: the table's last entry (2700) is also where the
//! recurrence takes over, so level 10 is never produced — xp 2699 is
//! level 9 and xp 2700 is already level 11.

/// Cumulative XP needed to reach levels 1 through 10 (index + 1 = level).
const XP_THRESHOLDS: [u32; 10] = [0, 100, 250, 450, 700, 1000, 1350, 1750, 2200, 2700];

/// XP requirement for level `n` beyond the table (n > 10).
fn recurrence(n: u32) -> u32 {
    2700 + (n - 10) * (500 + (n - 10) * 50)
}

/// The level reached with `xp` cumulative experience points.
pub fn level_from_xp(xp: u32) -> u32 {
    let top = XP_THRESHOLDS[XP_THRESHOLDS.len() - 1];
    if xp < top {
        for (i, threshold) in XP_THRESHOLDS.iter().enumerate().rev() {
            if xp >= *threshold {
                return (i + 1) as u32;
            }
        }
        return 1;
    }

    // Past the table: the smallest level whose requirement still exceeds xp
    let mut level = 11;
    loop {
        if xp < recurrence(level) {
            return level;
        }
        level += 1;
    }
}

/// Cumulative XP needed to leave `level`, i.e. to reach `level + 1`.
pub fn xp_for_next_level(level: u32) -> u32 {
    if level <= 9 {
        return XP_THRESHOLDS[level as usize];
    }
    // recurrence(10) is the table top itself (2700), the degenerate point
    // where the curve skips level 10.
    recurrence(level)
}

/// Cumulative XP at which `level` begins, for progress-bar rendering.
pub fn xp_for_level(level: u32) -> u32 {
    match level {
        0 | 1 => 0,
        2..=10 => XP_THRESHOLDS[(level - 1) as usize],
        _ => recurrence(level - 1),
    }
}

/// Fraction of the way from the current level's floor to the next one.
pub fn level_progress(xp: u32, level: u32) -> f64 {
    let floor = xp_for_level(level);
    let ceiling = xp_for_next_level(level);
    if ceiling <= floor {
        return 1.0;
    }
    (f64::from(xp.saturating_sub(floor)) / f64::from(ceiling - floor)).clamp(0.0, 1.0)
}

/// Level-band label shown on the profile.
pub fn title_from_level(level: u32) -> &'static str {
    match level {
        1..=4 => "Beginner",
        5..=9 => "Explorer",
        10..=14 => "Adventurer",
        15..=19 => "Warrior",
        _ if level >= 20 => "Champion",
        _ => "Rookie",
    }
}
