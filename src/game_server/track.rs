//! Track - Fixed stadium geometry and the racing axis
//!
//! The 100m straight runs along world Z toward negative Z. Everything the
//! race logic needs from the track is derived from these constants.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Inside edge of lane 1
pub const INNER_RADIUS: f32 = 27.082;
/// Outside edge of lane 8
pub const OUTER_RADIUS: f32 = 40.022;
/// Width of the running surface across all lanes
pub const TRACK_WIDTH: f32 = OUTER_RADIUS - INNER_RADIUS;
/// Number of lanes
pub const LANE_COUNT: u32 = 8;
/// Width of a single lane
pub const LANE_WIDTH: f32 = TRACK_WIDTH / LANE_COUNT as f32;
/// Height the player body spawns at above the track surface
pub const SPAWN_HEIGHT: f32 = 1.0;

/// Start coordinate and race length along the racing axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackAxis {
    /// Z coordinate of the start line
    pub start: f32,
    /// Total race distance in meters
    pub distance: f32,
}

impl Default for TrackAxis {
    fn default() -> Self {
        Self {
            start: 47.1,
            distance: 100.0,
        }
    }
}

impl TrackAxis {
    /// Z coordinate of the finish line
    pub fn finish(&self) -> f32 {
        self.start - self.distance
    }

    /// Position of a point along the racing axis
    #[inline]
    pub fn project(&self, position: Vec3) -> f32 {
        position.z
    }
}

/// X coordinate of the centre of a lane (0-based, clamped to the last lane)
pub fn lane_center(lane: u32) -> f32 {
    let lane = lane.min(LANE_COUNT - 1);
    INNER_RADIUS + (lane as f32 + 0.5) * LANE_WIDTH
}

/// Starting block position for a lane
pub fn starting_block(axis: &TrackAxis, lane: u32) -> Vec3 {
    Vec3::new(lane_center(lane), SPAWN_HEIGHT, axis.start)
}
