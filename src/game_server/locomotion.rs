//! Locomotion - Controls to body velocity
//!
//! Directional controls map to fixed world-space axes, not camera-relative
//! ones. Only the horizontal velocity is ours; the vertical component the
//! physics body already has is passed through untouched.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::game_server::input::{Control, ControlSample};
use crate::game_server::physics::PhysicsBody;
use crate::game_server::race::GamePhase;

/// Which controls may move the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Forward/backward and left/right
    Free,
    /// Forward/backward along the racing axis only
    TrackAxis,
    /// Forward only, so distance remaining never grows
    ForwardOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Speed per active axis (m/s)
    pub speed: f32,
    pub mode: MovementMode,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            mode: MovementMode::ForwardOnly,
        }
    }
}

/// Result of one locomotion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Horizontal velocity requested this frame (y is always 0)
    pub horizontal: Vec3,
}

impl Motion {
    pub fn is_moving(&self) -> bool {
        self.horizontal != Vec3::ZERO
    }
}

pub struct LocomotionController {
    config: LocomotionConfig,
    /// Last non-zero heading, kept while standing still
    facing: f32,
}

impl LocomotionController {
    /// Racing direction along world Z
    const FORWARD: Vec3 = Vec3::NEG_Z;
    const RIGHT: Vec3 = Vec3::X;

    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            facing: Self::heading(Self::FORWARD),
        }
    }

    /// Yaw the character faces, radians about +Y
    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Face down the track again (race reset)
    pub fn reset_facing(&mut self) {
        self.facing = Self::heading(Self::FORWARD);
    }

    /// Desired horizontal velocity for the sampled controls
    pub fn desired_velocity(&self, sample: &ControlSample, phase: GamePhase) -> Vec3 {
        if phase != GamePhase::Racing {
            return Vec3::ZERO;
        }

        let axis = |pos: Control, neg: Control| -> f32 {
            match (sample.is_down(pos), sample.is_down(neg)) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            }
        };

        let mut forward = axis(Control::Forward, Control::Backward);
        let mut right = axis(Control::Right, Control::Left);
        match self.config.mode {
            MovementMode::Free => {}
            MovementMode::TrackAxis => right = 0.0,
            MovementMode::ForwardOnly => {
                right = 0.0;
                forward = forward.max(0.0);
            }
        }

        (Self::FORWARD * forward + Self::RIGHT * right) * self.config.speed
    }

    /// Compute this frame's motion and write it to the body once
    pub fn step(
        &mut self,
        sample: &ControlSample,
        phase: GamePhase,
        body: &mut dyn PhysicsBody,
    ) -> Motion {
        let horizontal = self.desired_velocity(sample, phase);
        if horizontal != Vec3::ZERO {
            self.facing = Self::heading(horizontal);
        }

        let vertical = body.linvel().y;
        body.set_linvel(Vec3::new(horizontal.x, vertical, horizontal.z));

        Motion { horizontal }
    }

    fn heading(direction: Vec3) -> f32 {
        direction.x.atan2(direction.z)
    }
}
