//! Physics - Seam to the rigid-body engine
//!
//! The engine owns the authoritative transform. The simulation reads it
//! once per frame and writes back a velocity, plus an absolute transform
//! when the race resets.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// The player's rigid body as seen by the simulation
pub trait PhysicsBody {
    fn translation(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn linvel(&self) -> Vec3;
    fn set_linvel(&mut self, velocity: Vec3);
    fn set_translation(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);

    /// Teleport to `position`, upright and at rest
    fn reset_to(&mut self, position: Vec3) {
        self.set_translation(position);
        self.set_rotation(Quat::IDENTITY);
        self.set_linvel(Vec3::ZERO);
    }
}

/// Player transform as mirrored into the race state each frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerTransform {
    pub position: Vec3,
    /// Euler angles (XYZ order)
    pub rotation: Vec3,
}

impl PlayerTransform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    pub fn from_body(body: &dyn PhysicsBody) -> Self {
        let (x, y, z) = body.rotation().to_euler(EulerRot::XYZ);
        Self {
            position: body.translation(),
            rotation: Vec3::new(x, y, z),
        }
    }
}

/// Plain body state handed across the IPC boundary.
///
/// The frontend engine sends its body's state before the frame and applies
/// whatever the simulation wrote to it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    /// Set when the simulation teleported the body this frame
    #[serde(default)]
    pub teleported: bool,
}

impl BodyState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            teleported: false,
        }
    }
}

impl PhysicsBody for BodyState {
    fn translation(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn linvel(&self) -> Vec3 {
        self.linvel
    }

    fn set_linvel(&mut self, velocity: Vec3) {
        self.linvel = velocity;
    }

    fn set_translation(&mut self, position: Vec3) {
        self.position = position;
        self.teleported = true;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.teleported = true;
    }
}
