//! Race - Race configuration and shared race state
//!
//! `RaceState` is the single store the frame pipeline writes and the UI,
//! camera and tracker read. Every mutation goes through one entry point per
//! transition so the phase, clock and distance stay consistent.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::game_server::animation::{AnimationConfig, RestPolicy};
use crate::game_server::camera::CameraConfig;
use crate::game_server::input::KeyBindings;
use crate::game_server::locomotion::LocomotionConfig;
use crate::game_server::physics::PlayerTransform;
use crate::game_server::state_machine::SetHold;
use crate::game_server::track::{self, TrackAxis};

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Start line and race distance along the racing axis
    pub track: TrackAxis,
    /// Lane the player starts in (0-based)
    pub start_lane: u32,
    /// Pause between the start command and the gun. `None` goes straight to racing.
    pub set_hold: Option<SetHold>,
    pub locomotion: LocomotionConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub bindings: KeyBindings,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            track: TrackAxis::default(),
            start_lane: 3,
            set_hold: None,
            locomotion: LocomotionConfig::default(),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            bindings: KeyBindings::default(),
        }
    }
}

impl RaceConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(serde::de::Error::custom)?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            ("track.start", self.track.start),
            ("track.distance", self.track.distance),
            ("locomotion.speed", self.locomotion.speed),
            ("camera.distance", self.camera.distance),
            ("camera.initial_angle", self.camera.initial_angle),
            ("camera.initial_height", self.camera.initial_height),
            ("camera.angle_step", self.camera.angle_step),
            ("camera.height_step", self.camera.height_step),
            ("camera.min_height", self.camera.min_height),
            ("camera.max_height", self.camera.max_height),
            ("camera.look_offset", self.camera.look_offset),
            ("animation.cycle_step", self.animation.cycle_step),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite", name));
        }
        if self.track.distance <= 0.0 {
            return Err("track.distance must be positive".to_string());
        }
        if self.camera.min_height > self.camera.max_height {
            return Err(format!(
                "camera.min_height {} exceeds camera.max_height {}",
                self.camera.min_height, self.camera.max_height
            ));
        }
        if let RestPolicy::Damped { factor } = self.animation.rest {
            if !(0.0..1.0).contains(&factor) {
                return Err(format!("animation.rest damping factor {} not in [0, 1)", factor));
            }
        }
        Ok(())
    }

    /// Where the player is placed on every reset
    pub fn starting_block(&self) -> glam::Vec3 {
        track::starting_block(&self.track, self.start_lane)
    }
}

/// Race phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Ready,
    Set,
    Racing,
    Finished,
}

/// Start and end instants of the current race attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaceClock {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl RaceClock {
    /// Time since the start, frozen at the end once finished
    /// Race time so far, frozen once finished
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        let start = self.start?;
        let until = self.end.unwrap_or(now);
        Some(until.saturating_duration_since(start))
    }
}

/// Shared race state
#[derive(Debug, Clone)]
pub struct RaceState {
    phase: GamePhase,
    clock: RaceClock,
    /// Unrounded meters left to the finish
    distance_remaining: f32,
    full_distance: f32,
    player: PlayerTransform,
    set_deadline: Option<Instant>,
}

impl RaceState {
    pub fn new(config: &RaceConfig) -> Self {
        Self {
            phase: GamePhase::Ready,
            clock: RaceClock::default(),
            distance_remaining: config.track.distance,
            full_distance: config.track.distance,
            player: PlayerTransform::at(config.starting_block()),
            set_deadline: None,
        }
    }

    /// Current race phase
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Start and end instants of this attempt
    pub fn clock(&self) -> RaceClock {
        self.clock
    }

    /// Unrounded meters left to the finish
    pub fn distance_remaining(&self) -> f32 {
        self.distance_remaining
    }

    /// Distance as shown to the player, rounded up to whole meters
    pub fn distance_display(&self) -> u32 {
        self.distance_remaining.max(0.0).ceil() as u32
    }

    /// Last mirrored player transform
    pub fn player(&self) -> PlayerTransform {
        self.player
    }

    /// When the SET hold ends, if in SET
    pub fn set_deadline(&self) -> Option<Instant> {
        self.set_deadline
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.clock.elapsed(now)
    }

    fn clear_attempt(&mut self) {
        self.clock = RaceClock::default();
        self.distance_remaining = self.full_distance;
        self.set_deadline = None;
    }

    /// READY -> SET
    pub fn enter_set(&mut self, deadline: Instant) -> bool {
        if self.phase != GamePhase::Ready {
            return false;
        }
        self.clear_attempt();
        self.set_deadline = Some(deadline);
        self.phase = GamePhase::Set;
        true
    }

    /// READY or SET -> RACING. Starts the clock.
    pub fn enter_racing(&mut self, now: Instant) -> bool {
        if !matches!(self.phase, GamePhase::Ready | GamePhase::Set) {
            return false;
        }
        self.clear_attempt();
        self.clock.start = Some(now);
        self.phase = GamePhase::Racing;
        true
    }

    /// RACING -> FINISHED. Stops the clock.
    pub fn enter_finished(&mut self, now: Instant) -> bool {
        if self.phase != GamePhase::Racing {
            return false;
        }
        self.distance_remaining = 0.0;
        self.clock.end = Some(now);
        self.phase = GamePhase::Finished;
        true
    }

    /// FINISHED or SET -> READY. Clears the attempt.
    pub fn enter_ready(&mut self) -> bool {
        if !matches!(self.phase, GamePhase::Finished | GamePhase::Set) {
            return false;
        }
        self.clear_attempt();
        self.phase = GamePhase::Ready;
        true
    }

    /// Record the tracker's measurement. Ignored outside a race.
    pub fn record_distance(&mut self, meters: f32) {
        if self.phase == GamePhase::Racing {
            self.distance_remaining = meters.max(0.0);
        }
    }

    /// Per-frame copy of the physics transform
    pub fn mirror_player(&mut self, transform: PlayerTransform) {
        self.player = transform;
    }

    /// Compact view for the UI overlay
    pub fn snapshot(&self, now: Instant) -> RaceSnapshot {
        let elapsed = self.elapsed(now);
        RaceSnapshot {
            phase: self.phase,
            distance_remaining: self.distance_display(),
            elapsed_ms: elapsed.map(|e| e.as_millis() as u64),
            elapsed_display: elapsed.map(format_race_time),
            player: self.player,
        }
    }
}

/// Format a race time as `MM:SS.cc`
pub fn format_race_time(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let hundredths = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
}

/// Race state for IPC transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub phase: GamePhase,
    pub distance_remaining: u32,
    pub elapsed_ms: Option<u64>,
    pub elapsed_display: Option<String>,
    pub player: PlayerTransform,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RaceState {
        RaceState::new(&RaceConfig::default())
    }

    #[test]
    fn test_new_state_is_ready_with_full_distance() {
        let race = state();
        assert_eq!(race.phase(), GamePhase::Ready);
        assert_eq!(race.distance_display(), 100);
        assert_eq!(race.clock(), RaceClock::default());
        assert_eq!(race.elapsed(Instant::now()), None);
    }

    #[test]
    fn test_transitions_only_from_armed_phase() {
        let mut race = state();
        let now = Instant::now();

        assert!(!race.enter_finished(now));
        assert!(!race.enter_ready());
        assert!(race.enter_racing(now));
        assert!(!race.enter_racing(now));
        assert!(!race.enter_set(now));
        assert!(race.enter_finished(now));
        assert!(!race.enter_finished(now));
        assert!(race.enter_ready());
        assert_eq!(race.phase(), GamePhase::Ready);
    }

    #[test]
    fn test_clock_freezes_on_finish() {
        let mut race = state();
        let start = Instant::now();
        race.enter_racing(start);
        let end = start + Duration::from_millis(10_450);
        race.enter_finished(end);

        let later = end + Duration::from_secs(30);
        assert_eq!(race.elapsed(later), Some(Duration::from_millis(10_450)));
        assert_eq!(race.clock().end, Some(end));
    }

    #[test]
    fn test_distance_only_recorded_while_racing() {
        let mut race = state();
        race.record_distance(12.0);
        assert_eq!(race.distance_remaining(), 100.0);

        race.enter_racing(Instant::now());
        race.record_distance(42.3);
        assert_eq!(race.distance_display(), 43);
        race.record_distance(-4.0);
        assert_eq!(race.distance_remaining(), 0.0);
    }

    #[test]
    fn test_ready_clears_attempt() {
        let mut race = state();
        let now = Instant::now();
        race.enter_racing(now);
        race.record_distance(10.0);
        race.enter_finished(now);
        race.enter_ready();

        assert_eq!(race.clock(), RaceClock::default());
        assert_eq!(race.distance_remaining(), 100.0);
    }

    #[test]
    fn test_format_race_time() {
        assert_eq!(format_race_time(Duration::from_millis(0)), "00:00.00");
        assert_eq!(format_race_time(Duration::from_millis(9_876)), "00:09.87");
        assert_eq!(format_race_time(Duration::from_millis(125_430)), "02:05.43");
    }

    #[test]
    fn test_config_rejects_unusable_values() {
        let inverted = RaceConfig::from_json(r#"{"camera": {"min_height": 10.0, "max_height": 2.0}}"#);
        assert!(inverted.is_err());

        let undamped = RaceConfig::from_json(r#"{"animation": {"rest": {"damped": {"factor": 1.0}}}}"#);
        assert!(undamped.is_err());

        let backwards = RaceConfig::from_json(r#"{"track": {"distance": -5.0}}"#);
        assert!(backwards.is_err());

        let snap = RaceConfig::from_json(r#"{"animation": {"rest": "snap"}}"#).unwrap();
        assert_eq!(snap.animation.rest, RestPolicy::Snap);
    }

    #[test]
    fn test_inverted_camera_bounds_do_not_panic_the_core() {
        use crate::game_server::simulation::RaceSimulation;
        let config = RaceConfig {
            camera: CameraConfig {
                min_height: 10.0,
                max_height: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut sim = RaceSimulation::new(config);
        sim.input().key_down("arrowdown");
        let mut body = crate::game_server::physics::BodyState::at(glam::Vec3::ZERO);
        sim.frame(Some(&mut body), Instant::now());
        assert!((2.0..=10.0).contains(&sim.camera_orbit().height));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = RaceConfig::from_json(
            r#"{"start_lane": 5, "track": {"distance": 60.0}, "set_hold": {"min_ms": 1000, "max_ms": 2000}}"#,
        )
        .unwrap();
        assert_eq!(config.start_lane, 5);
        assert_eq!(config.track.distance, 60.0);
        assert_eq!(config.track.start, TrackAxis::default().start);
        assert!(config.set_hold.is_some());
        assert_eq!(config.camera, CameraConfig::default());
    }
}
