//! Bounded 2D kinematics for the simulated robot.
//!
//! One [`Simulation::step`] per committed (intent, emotion) pair:
//! base motion for the intent, scaled by the emotion gain, integrated with a
//! fixed 0.1 step, position clamped into the arena, heading left unwrapped.

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::intent::Intent;

/// Integration step applied to both linear and angular motion
pub const STEP_SCALE: f64 = 0.1;

/// Rectangular bounds for the robot position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            min_x: -3.5,
            max_x: 3.5,
            min_y: -1.8,
            max_y: 1.8,
        }
    }
}

impl Arena {
    /// Finite bounds with min <= max on both axes
    pub fn is_valid(&self) -> bool {
        let axis_ok = |min: f64, max: f64| min.is_finite() && max.is_finite() && min <= max;
        axis_ok(self.min_x, self.max_x) && axis_ok(self.min_y, self.max_y)
    }

    /// Clamp a point into the arena. NaN collapses to the lower bound.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (clamp_axis(x, self.min_x, self.max_x), clamp_axis(y, self.min_y, self.max_y))
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

fn clamp_axis(v: f64, min: f64, max: f64) -> f64 {
    if v.is_nan() {
        min
    } else {
        v.max(min).min(max)
    }
}

/// Robot position (arena units) and heading (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// Per-step motion, already scaled by the emotion gain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub linear: f64,
    pub angular: f64,
}

impl MotionCommand {
    /// Unscaled motion for an intent
    pub fn base(intent: Intent) -> Self {
        let (linear, angular) = match intent {
            Intent::Walk => (1.0, 0.0),
            Intent::Back => (-0.8, 0.0),
            Intent::TurnLeft => (0.0, 1.2),
            Intent::TurnRight => (0.0, -1.2),
            Intent::Stop | Intent::Idle => (0.0, 0.0),
        };
        Self { linear, angular }
    }

    pub fn new(intent: Intent, emotion: Emotion) -> Self {
        let base = Self::base(intent);
        let g = gain(emotion);
        Self {
            linear: base.linear * g,
            angular: base.angular * g,
        }
    }

    pub fn is_still(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}

/// Motion magnitude multiplier per emotion
pub fn gain(emotion: Emotion) -> f64 {
    match emotion {
        Emotion::Happy => 1.2,
        Emotion::Angry => 1.5,
        Emotion::Sad => 0.5,
        Emotion::Neutral => 1.0,
    }
}

/// Owned simulation context: one robot in one arena
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    pose: RobotPose,
    arena: Arena,
}

impl Simulation {
    pub fn new(arena: Arena) -> Self {
        Self {
            pose: RobotPose::default(),
            arena,
        }
    }

    /// Start from a given pose; the position is clamped into the arena.
    pub fn with_pose(arena: Arena, pose: RobotPose) -> Self {
        let (x, y) = arena.clamp(pose.x, pose.y);
        Self {
            pose: RobotPose { x, y, ..pose },
            arena,
        }
    }

    pub fn pose(&self) -> RobotPose {
        self.pose
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Apply exactly one update and return the motion used.
    pub fn step(&mut self, intent: Intent, emotion: Emotion) -> MotionCommand {
        let command = MotionCommand::new(intent, emotion);
        let RobotPose { x, y, heading } = self.pose;

        let (x, y) = self.arena.clamp(
            x + command.linear * heading.cos() * STEP_SCALE,
            y + command.linear * heading.sin() * STEP_SCALE,
        );

        self.pose = RobotPose {
            x,
            y,
            heading: heading + command.angular * STEP_SCALE,
        };
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn all_intents() -> [Intent; 6] {
        [
            Intent::Idle,
            Intent::Stop,
            Intent::Walk,
            Intent::Back,
            Intent::TurnLeft,
            Intent::TurnRight,
        ]
    }

    fn all_emotions() -> [Emotion; 4] {
        [Emotion::Neutral, Emotion::Happy, Emotion::Angry, Emotion::Sad]
    }

    #[test]
    fn test_arena_validity() {
        assert!(Arena::default().is_valid());
        let inverted = Arena {
            min_x: 1.0,
            max_x: -1.0,
            ..Arena::default()
        };
        assert!(!inverted.is_valid());
        let unbounded = Arena {
            max_y: f64::NAN,
            ..Arena::default()
        };
        assert!(!unbounded.is_valid());
    }

    #[test]
    fn test_gain_table() {
        assert_eq!(gain(Emotion::Happy), 1.2);
        assert_eq!(gain(Emotion::Angry), 1.5);
        assert_eq!(gain(Emotion::Sad), 0.5);
        assert_eq!(gain(Emotion::Neutral), 1.0);
    }

    #[test]
    fn test_walk_angry_from_origin() {
        let mut sim = Simulation::default();
        let cmd = sim.step(Intent::Walk, Emotion::Angry);
        assert!((cmd.linear - 1.5).abs() < EPS);
        assert!((sim.pose().x - 0.15).abs() < EPS);
        assert!(sim.pose().y.abs() < EPS);
        assert_eq!(sim.pose().heading, 0.0);
    }

    #[test]
    fn test_turn_left_neutral_increments_heading() {
        let mut sim = Simulation::default();
        sim.step(Intent::TurnLeft, Emotion::Neutral);
        assert!((sim.pose().heading - 0.12).abs() < EPS);
        sim.step(Intent::TurnLeft, Emotion::Neutral);
        assert!((sim.pose().heading - 0.24).abs() < EPS);
        assert_eq!(sim.pose().x, 0.0);
    }

    #[test]
    fn test_back_sad() {
        let mut sim = Simulation::default();
        sim.step(Intent::Back, Emotion::Sad);
        assert!((sim.pose().x + 0.04).abs() < EPS);
    }

    #[test]
    fn test_walk_follows_heading() {
        let pose = RobotPose {
            x: 0.0,
            y: 0.0,
            heading: std::f64::consts::FRAC_PI_2,
        };
        let mut sim = Simulation::with_pose(Arena::default(), pose);
        sim.step(Intent::Walk, Emotion::Neutral);
        assert!(sim.pose().x.abs() < EPS);
        assert!((sim.pose().y - 0.1).abs() < EPS);
    }

    #[test]
    fn test_heading_not_wrapped() {
        let mut sim = Simulation::default();
        for _ in 0..100 {
            sim.step(Intent::TurnLeft, Emotion::Angry);
        }
        assert!((sim.pose().heading - 18.0).abs() < 1e-6);
    }

    #[test]
    fn test_walk_stops_at_wall() {
        let pose = RobotPose {
            x: 3.5,
            y: 0.0,
            heading: 0.0,
        };
        let mut sim = Simulation::with_pose(Arena::default(), pose);
        for _ in 0..50 {
            sim.step(Intent::Walk, Emotion::Neutral);
            assert!(sim.pose().x <= 3.5);
        }
        assert_eq!(sim.pose().x, 3.5);
    }

    #[test]
    fn test_with_pose_clamps_start() {
        let pose = RobotPose {
            x: 10.0,
            y: -10.0,
            heading: 1.0,
        };
        let sim = Simulation::with_pose(Arena::default(), pose);
        assert_eq!(sim.pose().x, 3.5);
        assert_eq!(sim.pose().y, -1.8);
        assert_eq!(sim.pose().heading, 1.0);
    }

    #[test]
    fn test_every_pair_has_a_command() {
        for intent in all_intents() {
            for emotion in all_emotions() {
                let cmd = MotionCommand::new(intent, emotion);
                assert!(cmd.linear.is_finite() && cmd.angular.is_finite());
                if matches!(intent, Intent::Stop | Intent::Idle) {
                    assert!(cmd.is_still());
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_stop_and_idle_leave_pose_unchanged(
            x in -3.5f64..3.5, y in -1.8f64..1.8, heading in -10.0f64..10.0,
            steps in 1usize..50, idle in any::<bool>(), e in 0usize..4,
        ) {
            let start = RobotPose { x, y, heading };
            let mut sim = Simulation::with_pose(Arena::default(), start);
            let intent = if idle { Intent::Idle } else { Intent::Stop };
            for _ in 0..steps {
                sim.step(intent, all_emotions()[e]);
            }
            prop_assert_eq!(sim.pose(), start);
        }

        #[test]
        fn prop_position_always_in_arena(
            commands in proptest::collection::vec((0usize..6, 0usize..4), 0..200),
        ) {
            let mut sim = Simulation::default();
            for (i, e) in commands {
                sim.step(all_intents()[i], all_emotions()[e]);
                let pose = sim.pose();
                prop_assert!(sim.arena().contains(pose.x, pose.y));
            }
        }
    }
}
