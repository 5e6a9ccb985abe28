//! Tracker - Distance remaining and finish detection

use std::time::Instant;

use glam::Vec3;

use crate::game_server::race::{GamePhase, RaceState};
use crate::game_server::state_machine::{GameStateMachine, Transition};
use crate::game_server::track::TrackAxis;

pub struct ProgressTracker {
    axis: TrackAxis,
}

impl ProgressTracker {
    pub fn new(axis: TrackAxis) -> Self {
        Self { axis }
    }

    /// Unrounded meters between `position` and the finish line, never negative
    pub fn distance_remaining(&self, position: Vec3) -> f32 {
        (self.axis.project(position) - self.axis.finish()).max(0.0)
    }

    /// Whole meters as displayed
    pub fn display_distance(&self, position: Vec3) -> u32 {
        self.distance_remaining(position).ceil() as u32
    }

    /// Measure the player and finish the race once the line is reached
    pub fn update(
        &self,
        race: &mut RaceState,
        machine: &mut GameStateMachine,
        position: Vec3,
        now: Instant,
    ) -> Option<Transition> {
        if race.phase() != GamePhase::Racing {
            return None;
        }
        let remaining = self.distance_remaining(position);
        race.record_distance(remaining);
        if remaining <= 0.0 {
            return machine.finish(race, now);
        }
        None
    }
}
