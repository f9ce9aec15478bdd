// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Progress evaluators: one sample-driven state machine per activity type.
//!
//! Evaluators never poll; they consume externally supplied samples
//! (location fix, timer tick, rep set, manual check-off) and report when
//! the quest goal is met. Goal-met is one-shot: samples that keep arriving
//! after completion are ignored.

use geo::Point;

use crate::engine::goal::{self, GoalTarget, REPS_PER_SET};
use crate::models::{ActivityType, QuestTemplate};

/// Earth radius used by the legacy distance check, in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Arrival gate: within 100 m of the destination counts as reached.
const ARRIVAL_KM: f64 = 0.1;

/// Great-circle distance between two points in kilometers.
///
/// Points are (x, y) = (longitude, latitude) in degrees.
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let (lat1, lon1) = (a.y().to_radians(), a.x().to_radians());
    let (lat2, lon2) = (b.y().to_radians(), b.x().to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// A raw signal from the client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// New device coordinate (longitude, latitude in degrees)
    LocationFix { lon: f64, lat: f64 },
    /// One elapsed second of a running countdown
    TimerTick,
    /// One completed set of reps
    RepSet,
    /// The user marked the quest done
    ManualComplete,
    /// The user paused the countdown
    Pause,
    /// The user resumed the countdown
    Resume,
}

/// What a sample observation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Observed; goal not yet met
    Pending,
    /// This sample met the goal (fires exactly once)
    GoalMet,
    /// The sample does not apply to this evaluator or arrived after
    /// completion; state is unchanged
    Ignored,
}

/// Distance quests: reach a destination chosen by the client.
#[derive(Debug, Clone)]
pub struct DistanceEvaluator {
    destination: Point<f64>,
    last_distance_km: Option<f64>,
    completed: bool,
}

impl DistanceEvaluator {
    pub fn new(destination: Point<f64>) -> Self {
        Self {
            destination,
            last_distance_km: None,
            completed: false,
        }
    }

    /// Observe a location fix. Returns true exactly once, on the fix that
    /// first comes within the arrival gate; fixes keep arriving from the
    /// platform after completion and must not re-trigger.
    pub fn observe_fix(&mut self, position: Point<f64>) -> bool {
        if self.completed {
            return false;
        }
        let distance = haversine_km(position, self.destination);
        self.last_distance_km = Some(distance);
        if distance <= ARRIVAL_KM {
            self.completed = true;
            return true;
        }
        false
    }

    pub fn remaining_km(&self) -> Option<f64> {
        self.last_distance_km
    }
}

/// Rep quests: the user taps once per completed set of ten.
#[derive(Debug, Clone)]
pub struct RepsEvaluator {
    target_reps: u32,
    sets_completed: u32,
}

impl RepsEvaluator {
    pub fn new(target_reps: u32) -> Self {
        Self {
            target_reps,
            sets_completed: 0,
        }
    }

    /// Record a completed set. Returns true when this set meets the goal;
    /// further sets are refused once the target is reached.
    pub fn record_set(&mut self) -> bool {
        if self.is_met() {
            return false;
        }
        self.sets_completed += 1;
        self.is_met()
    }

    pub fn reps_done(&self) -> u32 {
        self.sets_completed * REPS_PER_SET
    }

    /// Reps shown to the user, clamped so the display never exceeds the target.
    pub fn display_reps(&self) -> u32 {
        self.reps_done().min(self.target_reps)
    }

    pub fn progress(&self) -> f64 {
        if self.target_reps == 0 {
            return 0.0;
        }
        (f64::from(self.reps_done()) / f64::from(self.target_reps)).min(1.0)
    }

    fn is_met(&self) -> bool {
        self.target_reps > 0 && self.reps_done() >= self.target_reps
    }
}

/// Timed quests: a countdown that only runs while explicitly started.
#[derive(Debug, Clone)]
pub struct TimedEvaluator {
    initial_seconds: u32,
    remaining_seconds: u32,
    running: bool,
}

impl TimedEvaluator {
    pub fn new(total_seconds: u32) -> Self {
        Self {
            initial_seconds: total_seconds,
            remaining_seconds: total_seconds,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining_seconds > 0 {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Observe one elapsed second. Ticks while paused or after expiry are
    /// ignored. Returns true exactly when the countdown reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn progress(&self) -> f64 {
        if self.initial_seconds == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.remaining_seconds) / f64::from(self.initial_seconds)
    }
}

/// Wellness quests: a single manual check-off.
#[derive(Debug, Clone, Default)]
pub struct WellnessEvaluator {
    completed: bool,
}

impl WellnessEvaluator {
    pub fn mark_done(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        true
    }
}

/// The evaluator for one in-flight quest, keyed by activity type.
#[derive(Debug, Clone)]
pub enum ProgressEvaluator {
    Distance(DistanceEvaluator),
    Reps(RepsEvaluator),
    Timed(TimedEvaluator),
    Wellness(WellnessEvaluator),
}

impl ProgressEvaluator {
    /// Build the evaluator for a quest template.
    ///
    /// Active quests need the destination the client picked; without one
    /// the quest cannot be started.
    pub fn for_quest(template: &QuestTemplate, destination: Option<Point<f64>>) -> Option<Self> {
        match goal::parse_goal(&template.goal, template.activity_type) {
            GoalTarget::DistanceKm(_) => destination
                .map(|dest| ProgressEvaluator::Distance(DistanceEvaluator::new(dest))),
            GoalTarget::Reps(target) => {
                Some(ProgressEvaluator::Reps(RepsEvaluator::new(target)))
            }
            GoalTarget::Seconds(total) => {
                let mut timer = TimedEvaluator::new(total);
                timer.start();
                Some(ProgressEvaluator::Timed(timer))
            }
            GoalTarget::Manual => {
                Some(ProgressEvaluator::Wellness(WellnessEvaluator::default()))
            }
        }
    }

    /// Feed one sample through the evaluator.
    pub fn observe(&mut self, sample: Sample) -> SampleOutcome {
        match (self, sample) {
            (ProgressEvaluator::Distance(eval), Sample::LocationFix { lon, lat }) => {
                if eval.observe_fix(Point::new(lon, lat)) {
                    SampleOutcome::GoalMet
                } else if eval.completed {
                    SampleOutcome::Ignored
                } else {
                    SampleOutcome::Pending
                }
            }
            (ProgressEvaluator::Reps(eval), Sample::RepSet) => {
                if eval.record_set() {
                    SampleOutcome::GoalMet
                } else if eval.is_met() {
                    SampleOutcome::Ignored
                } else {
                    SampleOutcome::Pending
                }
            }
            (ProgressEvaluator::Timed(eval), Sample::TimerTick) => {
                if !eval.running || eval.remaining_seconds == 0 {
                    SampleOutcome::Ignored
                } else if eval.tick() {
                    SampleOutcome::GoalMet
                } else {
                    SampleOutcome::Pending
                }
            }
            (ProgressEvaluator::Timed(eval), Sample::Pause) => {
                eval.pause();
                SampleOutcome::Pending
            }
            (ProgressEvaluator::Timed(eval), Sample::Resume) => {
                eval.start();
                SampleOutcome::Pending
            }
            (ProgressEvaluator::Wellness(eval), Sample::ManualComplete) => {
                if eval.mark_done() {
                    SampleOutcome::GoalMet
                } else {
                    SampleOutcome::Ignored
                }
            }
            _ => SampleOutcome::Ignored,
        }
    }

    /// Current progress fraction, where the evaluator tracks one.
    pub fn progress(&self) -> Option<f64> {
        match self {
            ProgressEvaluator::Distance(_) => None,
            ProgressEvaluator::Reps(eval) => Some(eval.progress()),
            ProgressEvaluator::Timed(eval) => Some(eval.progress()),
            ProgressEvaluator::Wellness(eval) => {
                Some(if eval.completed { 1.0 } else { 0.0 })
            }
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        match self {
            ProgressEvaluator::Distance(_) => ActivityType::Active,
            ProgressEvaluator::Reps(_) => ActivityType::Reps,
            ProgressEvaluator::Timed(_) => ActivityType::Timed,
            ProgressEvaluator::Wellness(_) => ActivityType::Wellness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Environment;

    fn template(activity_type: ActivityType, goal: &str) -> QuestTemplate {
        QuestTemplate {
            id: "q1".to_string(),
            title: "Test quest".to_string(),
            category: String::new(),
            environment: Environment::Any,
            activity_type,
            fitness_category: String::new(),
            xp: 100,
            calories: 50,
            icon: String::new(),
            status: "active".to_string(),
            goal: goal.to_string(),
            distance_stat_key: None,
        }
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Point::new(-122.4194, 37.7749); // San Francisco
        let b = Point::new(-73.9857, 40.7484); // New York
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 4000.0 && ab < 4200.0);
    }

    #[test]
    fn test_haversine_zero_at_same_point() {
        let p = Point::new(13.4050, 52.5200);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_distance_evaluator_is_one_shot() {
        let dest = Point::new(-122.4194, 37.7749);
        let mut eval = DistanceEvaluator::new(dest);

        // ~1.1 km north of the destination: not arrived
        assert!(!eval.observe_fix(Point::new(-122.4194, 37.7849)));
        // At the destination: arrived
        assert!(eval.observe_fix(dest));
        // Fixes keep arriving after completion and must not re-trigger
        assert!(!eval.observe_fix(dest));
        assert!(!eval.observe_fix(Point::new(-122.4194, 37.7849)));
    }

    #[test]
    fn test_distance_gate_is_100_meters() {
        let dest = Point::new(0.0, 0.0);
        // ~0.09 km north of the destination (1 deg lat ~ 111.19 km)
        let near = Point::new(0.0, 0.0008);
        // ~0.22 km north
        let far = Point::new(0.0, 0.002);

        let mut eval = DistanceEvaluator::new(dest);
        assert!(!eval.observe_fix(far));
        assert!(eval.observe_fix(near));
    }

    #[test]
    fn test_reps_30_takes_exactly_three_sets() {
        let mut eval = RepsEvaluator::new(30);
        assert!(!eval.record_set());
        assert!(!eval.record_set());
        assert!(eval.record_set());
        // A fourth tap is refused
        assert!(!eval.record_set());
        assert_eq!(eval.reps_done(), 30);
    }

    #[test]
    fn test_reps_display_never_exceeds_target() {
        // Target 25 with 10-rep sets overshoots on the third set
        let mut eval = RepsEvaluator::new(25);
        eval.record_set();
        eval.record_set();
        assert!(eval.record_set());
        assert_eq!(eval.reps_done(), 30);
        assert_eq!(eval.display_reps(), 25);
        assert_eq!(eval.progress(), 1.0);
    }

    #[test]
    fn test_reps_zero_target_never_completes() {
        let mut eval = RepsEvaluator::new(0);
        for _ in 0..50 {
            assert!(!eval.record_set());
        }
    }

    #[test]
    fn test_timer_counts_down_to_exactly_zero() {
        let mut eval = TimedEvaluator::new(3);
        eval.start();
        assert!(!eval.tick());
        assert!(!eval.tick());
        assert!(eval.tick());
        assert_eq!(eval.remaining(), 0);
        // Late ticks are ignored
        assert!(!eval.tick());
    }

    #[test]
    fn test_timer_only_runs_while_started() {
        let mut eval = TimedEvaluator::new(10);
        // Not started: ticks do nothing
        assert!(!eval.tick());
        assert_eq!(eval.remaining(), 10);

        eval.start();
        eval.tick();
        assert_eq!(eval.remaining(), 9);

        eval.pause();
        eval.tick();
        eval.tick();
        assert_eq!(eval.remaining(), 9);

        eval.start();
        eval.tick();
        assert_eq!(eval.remaining(), 8);
    }

    #[test]
    fn test_wellness_is_one_shot() {
        let mut eval = WellnessEvaluator::default();
        assert!(eval.mark_done());
        assert!(!eval.mark_done());
    }

    #[test]
    fn test_for_quest_requires_destination_for_active() {
        let quest = template(ActivityType::Active, "2km");
        assert!(ProgressEvaluator::for_quest(&quest, None).is_none());
        assert!(
            ProgressEvaluator::for_quest(&quest, Some(Point::new(0.0, 0.0))).is_some()
        );
    }

    #[test]
    fn test_observe_ignores_mismatched_samples() {
        let quest = template(ActivityType::Reps, "30");
        let mut eval = ProgressEvaluator::for_quest(&quest, None).unwrap();
        assert_eq!(eval.observe(Sample::TimerTick), SampleOutcome::Ignored);
        assert_eq!(
            eval.observe(Sample::LocationFix { lon: 0.0, lat: 0.0 }),
            SampleOutcome::Ignored
        );
        assert_eq!(eval.observe(Sample::RepSet), SampleOutcome::Pending);
        let progress = eval.progress().unwrap();
        assert!((progress - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_observe_goal_met_fires_once() {
        let quest = template(ActivityType::Wellness, "Sleep 8 hours");
        let mut eval = ProgressEvaluator::for_quest(&quest, None).unwrap();
        assert_eq!(eval.observe(Sample::ManualComplete), SampleOutcome::GoalMet);
        assert_eq!(eval.observe(Sample::ManualComplete), SampleOutcome::Ignored);
    }
}
