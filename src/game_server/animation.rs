//! Animation - Procedural run cycle for the five body segments
//!
//! Each segment has evenly spaced keyframes over a normalized cycle. The
//! blender advances the cycle a fixed step per frame while the runner moves
//! and eases the limbs back to the rest pose once it stops. It never
//! touches the physics body.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Body segments driven by the run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Torso,
        Segment::LeftArm,
        Segment::RightArm,
        Segment::LeftLeg,
        Segment::RightLeg,
    ];
}

/// Segment rotation (Euler XYZ, radians) at a point in the cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub rotation: Vec3,
}

impl Keyframe {
    pub fn new(time: f32, rotation: Vec3) -> Self {
        Self { time, rotation }
    }
}

/// Keyframes must be finite, inside [0, 1] and in time order
fn well_formed(keys: &[Keyframe]) -> bool {
    !keys.is_empty()
        && keys
            .iter()
            .all(|k| (0.0..=1.0).contains(&k.time) && k.rotation.is_finite())
        && keys.windows(2).all(|w| w[0].time <= w[1].time)
}

/// Sample a keyframe track at cycle position `t`.
///
/// Bad input (no keys, NaNs, unordered times) yields the rest rotation.
pub fn sample_track(keys: &[Keyframe], t: f32) -> Vec3 {
    if !well_formed(keys) || !t.is_finite() {
        return Vec3::ZERO;
    }
    let count = keys.len();
    if count == 1 {
        return keys[0].rotation;
    }

    let scaled = t.clamp(0.0, 1.0) * (count - 1) as f32;
    let index = (scaled.floor() as usize).min(count - 1);
    let next = (index + 1) % count;
    let frac = scaled - index as f32;

    keys[index].rotation.lerp(keys[next].rotation, frac)
}

/// Rotation of every segment for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub torso: Vec3,
    pub left_arm: Vec3,
    pub right_arm: Vec3,
    pub left_leg: Vec3,
    pub right_leg: Vec3,
}

impl Pose {
    pub const REST: Pose = Pose {
        torso: Vec3::ZERO,
        left_arm: Vec3::ZERO,
        right_arm: Vec3::ZERO,
        left_leg: Vec3::ZERO,
        right_leg: Vec3::ZERO,
    };

    /// Rotation of one segment
    pub fn get(&self, segment: Segment) -> Vec3 {
        match segment {
            Segment::Torso => self.torso,
            Segment::LeftArm => self.left_arm,
            Segment::RightArm => self.right_arm,
            Segment::LeftLeg => self.left_leg,
            Segment::RightLeg => self.right_leg,
        }
    }

    fn get_mut(&mut self, segment: Segment) -> &mut Vec3 {
        match segment {
            Segment::Torso => &mut self.torso,
            Segment::LeftArm => &mut self.left_arm,
            Segment::RightArm => &mut self.right_arm,
            Segment::LeftLeg => &mut self.left_leg,
            Segment::RightLeg => &mut self.right_leg,
        }
    }

    fn max_abs(&self) -> f32 {
        Segment::ALL
            .iter()
            .map(|s| self.get(*s).abs().max_element())
            .fold(0.0, f32::max)
    }
}

/// Keyframe tracks for all segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunClip {
    pub torso: Vec<Keyframe>,
    pub left_arm: Vec<Keyframe>,
    pub right_arm: Vec<Keyframe>,
    pub left_leg: Vec<Keyframe>,
    pub right_leg: Vec<Keyframe>,
}

impl RunClip {
    pub fn track(&self, segment: Segment) -> &[Keyframe] {
        match segment {
            Segment::Torso => &self.torso,
            Segment::LeftArm => &self.left_arm,
            Segment::RightArm => &self.right_arm,
            Segment::LeftLeg => &self.left_leg,
            Segment::RightLeg => &self.right_leg,
        }
    }

    /// Pose at cycle position `t`
    pub fn sample(&self, t: f32) -> Pose {
        let mut pose = Pose::REST;
        for segment in Segment::ALL {
            *pose.get_mut(segment) = sample_track(self.track(segment), t);
        }
        pose
    }
}

impl Default for RunClip {
    fn default() -> Self {
        const TIMES: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
        // Leg swing about X; arms counter-swing against the same-side leg
        const SWING: [f32; 5] = [0.7, 0.0, -0.7, 0.0, 0.7];
        const SWAY: [f32; 5] = [0.05, 0.0, -0.05, 0.0, 0.05];
        const LEAN: f32 = 0.15;

        let track = |f: &dyn Fn(usize) -> Vec3| -> Vec<Keyframe> {
            TIMES
                .iter()
                .enumerate()
                .map(|(i, time)| Keyframe::new(*time, f(i)))
                .collect()
        };

        Self {
            torso: track(&|i| Vec3::new(LEAN, 0.0, SWAY[i])),
            left_arm: track(&|i| Vec3::new(-0.8 * SWING[i], 0.0, 0.0)),
            right_arm: track(&|i| Vec3::new(0.8 * SWING[i], 0.0, 0.0)),
            left_leg: track(&|i| Vec3::new(SWING[i], 0.0, 0.0)),
            right_leg: track(&|i| Vec3::new(-SWING[i], 0.0, 0.0)),
        }
    }
}

/// What happens to the cycle when the runner starts moving again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRestart {
    /// Every stop-to-move transition restarts at 0
    Always,
    /// Restart at 0 only if the last run completed a full cycle,
    /// otherwise resume where it stopped
    AfterCompletedCycle,
}

/// How limbs return to rest while stopped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPolicy {
    Snap,
    /// Multiply every rotation by `factor` each frame
    Damped { factor: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Cycle advance per frame while moving
    pub cycle_step: f32,
    pub restart: CycleRestart,
    pub rest: RestPolicy,
    pub clip: RunClip,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            cycle_step: 0.04,
            restart: CycleRestart::Always,
            rest: RestPolicy::Damped { factor: 0.9 },
            clip: RunClip::default(),
        }
    }
}

pub struct AnimationBlender {
    config: AnimationConfig,
    /// Cycle position in [0, 1)
    cycle: f32,
    /// Whether the current or last run wrapped the cycle at least once
    completed: bool,
    moving: bool,
    pose: Pose,
}

impl AnimationBlender {
    /// Rotations smaller than this snap to rest when damping
    const REST_EPSILON: f32 = 1e-3;

    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            cycle: 0.0,
            completed: false,
            moving: false,
            pose: Pose::REST,
        }
    }

    /// Cycle position in [0, 1)
    pub fn cycle(&self) -> f32 {
        self.cycle
    }

    /// Pose produced by the last update
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Back to a standing start
    pub fn reset(&mut self) {
        self.cycle = 0.0;
        self.completed = false;
        self.moving = false;
        self.pose = Pose::REST;
    }

    /// Advance one frame
    pub fn update(&mut self, moving: bool) -> Pose {
        if moving {
            if !self.moving {
                self.on_start();
            }
            self.pose = self.config.clip.sample(self.cycle);
            self.cycle += self.config.cycle_step;
            if self.cycle >= 1.0 {
                self.cycle = self.cycle.fract();
                self.completed = true;
            }
        } else {
            self.settle();
        }
        self.moving = moving;
        self.pose
    }

    fn on_start(&mut self) {
        let restart = match self.config.restart {
            CycleRestart::Always => true,
            CycleRestart::AfterCompletedCycle => self.completed,
        };
        if restart {
            self.cycle = 0.0;
        }
        self.completed = false;
    }

    fn settle(&mut self) {
        match self.config.rest {
            RestPolicy::Snap => self.pose = Pose::REST,
            RestPolicy::Damped { factor } if (0.0..1.0).contains(&factor) => {
                for segment in Segment::ALL {
                    *self.pose.get_mut(segment) *= factor;
                }
                if self.pose.max_abs() < Self::REST_EPSILON {
                    self.pose = Pose::REST;
                }
            }
            // A factor that would never settle
            RestPolicy::Damped { .. } => self.pose = Pose::REST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blender(step: f32, restart: CycleRestart, rest: RestPolicy) -> AnimationBlender {
        AnimationBlender::new(AnimationConfig {
            cycle_step: step,
            restart,
            rest,
            clip: RunClip::default(),
        })
    }

    #[test]
    fn test_sample_interpolates_between_neighbours() {
        let keys = vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(0.5, Vec3::new(1.0, 0.0, 0.0)),
            Keyframe::new(1.0, Vec3::ZERO),
        ];
        assert_eq!(sample_track(&keys, 0.0), Vec3::ZERO);
        assert!((sample_track(&keys, 0.25).x - 0.5).abs() < 1e-6);
        assert!((sample_track(&keys, 0.5).x - 1.0).abs() < 1e-6);
        assert!((sample_track(&keys, 0.75).x - 0.5).abs() < 1e-6);
        assert_eq!(sample_track(&keys, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_degenerate_tracks_give_rest_pose() {
        assert_eq!(sample_track(&[], 0.3), Vec3::ZERO);

        let unordered = vec![
            Keyframe::new(0.6, Vec3::ONE),
            Keyframe::new(0.2, Vec3::ONE),
        ];
        assert_eq!(sample_track(&unordered, 0.3), Vec3::ZERO);

        let nan = vec![Keyframe::new(0.0, Vec3::new(f32::NAN, 0.0, 0.0))];
        assert_eq!(sample_track(&nan, 0.3), Vec3::ZERO);

        let single = vec![Keyframe::new(0.0, Vec3::ONE)];
        assert_eq!(sample_track(&single, 0.7), Vec3::ONE);
        assert_eq!(sample_track(&single, f32::NAN), Vec3::ZERO);
    }

    #[test]
    fn test_clip_is_continuous_across_wrap() {
        let clip = RunClip::default();
        let start = clip.sample(0.0);
        let end = clip.sample(1.0);
        for segment in Segment::ALL {
            assert!((start.get(segment) - end.get(segment)).length() < 1e-6);
        }
    }

    #[test]
    fn test_empty_segment_track_rests_others_animate() {
        let clip = RunClip {
            torso: Vec::new(),
            ..RunClip::default()
        };
        let pose = clip.sample(0.0);
        assert_eq!(pose.torso, Vec3::ZERO);
        assert!(pose.left_leg.x > 0.0);
    }

    #[test]
    fn test_cycle_wraps_with_period_one() {
        let mut blender = blender(0.25, CycleRestart::Always, RestPolicy::Snap);
        let mut seen = Vec::new();
        for _ in 0..12 {
            blender.update(true);
            let c = blender.cycle();
            assert!((0.0..1.0).contains(&c));
            seen.push(c);
        }
        for i in 4..seen.len() {
            assert!((seen[i] - seen[i - 4]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_limbs_swing_in_opposition() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Snap);
        let pose = blender.update(true);
        assert!(pose.left_leg.x > 0.0);
        assert!(pose.right_leg.x < 0.0);
        assert!(pose.left_arm.x < 0.0);
        assert!(pose.right_arm.x > 0.0);
    }

    #[test]
    fn test_snap_rest_is_immediate() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Snap);
        blender.update(true);
        assert_eq!(blender.update(false), Pose::REST);
    }

    #[test]
    fn test_damped_rest_decays_then_settles() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Damped { factor: 0.9 });
        let moving = blender.update(true);
        let first = blender.update(false);
        assert!((first.left_leg.x - moving.left_leg.x * 0.9).abs() < 1e-6);

        let mut previous = first.max_abs();
        for _ in 0..200 {
            let pose = blender.update(false);
            assert!(pose.max_abs() <= previous);
            previous = pose.max_abs();
        }
        assert_eq!(blender.pose(), Pose::REST);
    }

    #[test]
    fn test_out_of_range_damping_snaps_to_rest() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Damped { factor: 1.5 });
        blender.update(true);
        assert_eq!(blender.update(false), Pose::REST);
    }

    #[test]
    fn test_restart_always_resets_cycle() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Snap);
        for _ in 0..3 {
            blender.update(true);
        }
        blender.update(false);
        blender.update(true);
        assert!((blender.cycle() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_restart_after_completed_cycle_resumes_partial() {
        let mut blender = blender(0.1, CycleRestart::AfterCompletedCycle, RestPolicy::Snap);
        for _ in 0..3 {
            blender.update(true);
        }
        blender.update(false);
        blender.update(true);
        assert!((blender.cycle() - 0.4).abs() < 1e-5);

        for _ in 0..8 {
            blender.update(true);
        }
        blender.update(false);
        blender.update(true);
        assert!((blender.cycle() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_reset_returns_to_rest() {
        let mut blender = blender(0.1, CycleRestart::Always, RestPolicy::Snap);
        blender.update(true);
        blender.reset();
        assert_eq!(blender.cycle(), 0.0);
        assert_eq!(blender.pose(), Pose::REST);
    }
}
