//! Camera - Orbit follow camera
//!
//! Polar offset around the player: the angle is free, the height is
//! clamped. Runs every frame whatever the race phase.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::game_server::input::{Control, ControlSample};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal distance from the player
    pub distance: f32,
    pub initial_angle: f32,
    pub initial_height: f32,
    /// Radians per frame while a rotate control is held
    pub angle_step: f32,
    /// Meters per frame while a height control is held
    pub height_step: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Look target height above the player origin
    pub look_offset: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 8.0,
            initial_angle: 0.0,
            initial_height: 4.0,
            angle_step: 0.03,
            height_step: 0.1,
            min_height: 2.0,
            max_height: 10.0,
            look_offset: 1.0,
        }
    }
}

impl CameraConfig {
    /// Height bounds in ascending order. Non-finite bounds fall back to the defaults.
    pub fn height_bounds(&self) -> (f32, f32) {
        let (lo, hi) = if self.min_height.is_finite() && self.max_height.is_finite() {
            (self.min_height, self.max_height)
        } else {
            let d = CameraConfig::default();
            (d.min_height, d.max_height)
        };
        (lo.min(hi), lo.max(hi))
    }
}

/// Persistent orbit parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraOrbit {
    pub angle: f32,
    pub height: f32,
}

/// Where the renderer should put the viewpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
}

pub struct CameraFollow {
    config: CameraConfig,
    orbit: CameraOrbit,
}

impl CameraFollow {
    pub fn new(config: CameraConfig) -> Self {
        let (lo, hi) = config.height_bounds();
        let height = if config.initial_height.is_finite() {
            config.initial_height
        } else {
            lo
        };
        let orbit = CameraOrbit {
            angle: config.initial_angle,
            height: height.clamp(lo, hi),
        };
        Self { config, orbit }
    }

    /// Current orbit angle and height
    pub fn orbit(&self) -> CameraOrbit {
        self.orbit
    }

    /// Apply held camera controls, then frame the player
    pub fn update(&mut self, sample: &ControlSample, player: Vec3) -> CameraView {
        let c = &self.config;
        if sample.is_down(Control::CameraLeft) {
            self.orbit.angle -= c.angle_step;
        }
        if sample.is_down(Control::CameraRight) {
            self.orbit.angle += c.angle_step;
        }
        if sample.is_down(Control::CameraUp) {
            self.orbit.height += c.height_step;
        }
        if sample.is_down(Control::CameraDown) {
            self.orbit.height -= c.height_step;
        }
        let (lo, hi) = c.height_bounds();
        self.orbit.height = self.orbit.height.clamp(lo, hi);

        self.view(player)
    }

    /// Eye and look target for the current orbit
    pub fn view(&self, player: Vec3) -> CameraView {
        let offset = Vec3::new(
            self.orbit.angle.sin() * self.config.distance,
            self.orbit.height,
            self.orbit.angle.cos() * self.config.distance,
        );
        CameraView {
            eye: player + offset,
            target: player + Vec3::Y * self.config.look_offset,
        }
    }
}
