//! Simulation - Per-frame pipeline and game server
//!
//! `RaceSimulation` runs the components in a fixed order each frame:
//! input sample, state machine, camera, locomotion, animation, progress
//! tracker, then the mirror into the race state. `GameServer` wraps it for
//! the host with wall-clock time and tick statistics.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::game_server::animation::{AnimationBlender, Pose};
use crate::game_server::camera::{CameraFollow, CameraOrbit, CameraView};
use crate::game_server::input::{Control, InputSampler};
use crate::game_server::locomotion::LocomotionController;
use crate::game_server::physics::{BodyState, PhysicsBody, PlayerTransform};
use crate::game_server::race::{GamePhase, RaceConfig, RaceSnapshot, RaceState};
use crate::game_server::state_machine::{GameStateMachine, Transition};
use crate::game_server::tracker::ProgressTracker;

/// Everything the renderer and UI need from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    /// No physics body was available, nothing advanced
    pub skipped: bool,
    pub transitions: Vec<Transition>,
    /// Facing yaw of the character mesh
    pub facing: f32,
    pub pose: Pose,
    pub camera: Option<CameraView>,
    pub race: RaceSnapshot,
}

/// The race simulation core
pub struct RaceSimulation {
    input: InputSampler,
    race: RaceState,
    machine: GameStateMachine,
    camera: CameraFollow,
    locomotion: LocomotionController,
    animation: AnimationBlender,
    tracker: ProgressTracker,
    last_view: Option<CameraView>,
}

impl RaceSimulation {
    /// Create a simulation in READY
    pub fn new(config: RaceConfig) -> Self {
        let machine = GameStateMachine::new(&config);
        Self::with_machine(config, machine)
    }

    /// Build with a caller-supplied state machine (seeded randomness)
    pub fn with_machine(config: RaceConfig, machine: GameStateMachine) -> Self {
        Self {
            input: InputSampler::new(config.bindings.clone()),
            race: RaceState::new(&config),
            machine,
            camera: CameraFollow::new(config.camera),
            locomotion: LocomotionController::new(config.locomotion),
            animation: AnimationBlender::new(config.animation.clone()),
            tracker: ProgressTracker::new(config.track),
            last_view: None,
        }
    }

    /// Input sampler, for feeding key events between frames
    pub fn input(&mut self) -> &mut InputSampler {
        &mut self.input
    }

    /// Shared race state
    pub fn race(&self) -> &RaceState {
        &self.race
    }

    /// Current camera orbit
    pub fn camera_orbit(&self) -> CameraOrbit {
        self.camera.orbit()
    }

    /// Run one frame. Without a body the frame is skipped and retried next time.
    pub fn frame(&mut self, body: Option<&mut dyn PhysicsBody>, now: Instant) -> FrameOutput {
        let Some(body) = body else {
            log::trace!("No physics body yet, skipping frame");
            return self.output(true, Vec::new(), now);
        };

        let sample = self.input.sample();
        let mut transitions = Vec::new();

        if let Some(transition) = self.machine.update(&mut self.race, &sample, now, body) {
            if matches!(transition, Transition::Set | Transition::Reset)
                || (transition == Transition::Go && sample.was_pressed(Control::Start))
            {
                self.locomotion.reset_facing();
                self.animation.reset();
            }
            transitions.push(transition);
        }

        let position = body.translation();
        self.last_view = Some(self.camera.update(&sample, position));

        let motion = self.locomotion.step(&sample, self.race.phase(), body);
        self.animation.update(motion.is_moving());

        if let Some(transition) = self.tracker.update(&mut self.race, &mut self.machine, position, now) {
            transitions.push(transition);
        }

        self.race.mirror_player(PlayerTransform::from_body(body));
        self.output(false, transitions, now)
    }

    fn output(&self, skipped: bool, transitions: Vec<Transition>, now: Instant) -> FrameOutput {
        FrameOutput {
            skipped,
            transitions,
            facing: self.locomotion.facing(),
            pose: self.animation.pose(),
            camera: self.last_view,
            race: self.race.snapshot(now),
        }
    }
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub frame_count: u64,
    pub skipped_frames: u64,
    pub avg_frame_time_ms: f32,
    pub phase: GamePhase,
}

/// Host-facing wrapper: owns the simulation and the wall clock
pub struct GameServer {
    config: RaceConfig,
    sim: RaceSimulation,
    /// Recent frame processing times for averaging
    frame_times: Vec<f32>,
    frame_count: u64,
    skipped_frames: u64,
}

impl GameServer {
    const STATS_WINDOW: usize = 60;

    /// Create a new game server
    pub fn new(config: RaceConfig) -> Self {
        Self {
            sim: RaceSimulation::new(config.clone()),
            config,
            frame_times: Vec::with_capacity(Self::STATS_WINDOW),
            frame_count: 0,
            skipped_frames: 0,
        }
    }

    /// Replace the configuration and start over in READY
    pub fn init_race(&mut self, config: RaceConfig) {
        self.config = config;
        self.reset();
    }

    /// Forward a key-down event
    pub fn key_down(&mut self, key: &str) -> bool {
        self.sim.input().key_down(key)
    }

    /// Forward a key-up event
    pub fn key_up(&mut self, key: &str) -> bool {
        self.sim.input().key_up(key)
    }

    /// Release every held key
    pub fn release_keys(&mut self) {
        self.sim.input().release_all();
    }

    /// Run a frame against the body state the frontend sent.
    ///
    /// Returns the frame output and the body as the simulation left it.
    pub fn frame(&mut self, body: Option<BodyState>) -> (FrameOutput, Option<BodyState>) {
        let frame_start = Instant::now();

        let mut body = body.map(|mut b| {
            b.teleported = false;
            b
        });
        let output = self
            .sim
            .frame(body.as_mut().map(|b| b as &mut dyn PhysicsBody), frame_start);

        self.frame_count += 1;
        if output.skipped {
            self.skipped_frames += 1;
        }

        let frame_time = frame_start.elapsed().as_secs_f32() * 1000.0;
        self.frame_times.push(frame_time);
        if self.frame_times.len() > Self::STATS_WINDOW {
            self.frame_times.remove(0);
        }

        (output, body)
    }

    /// Current race state without advancing
    pub fn get_snapshot(&self) -> RaceSnapshot {
        self.sim.race().snapshot(Instant::now())
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_frame_time = if self.frame_times.is_empty() {
            0.0
        } else {
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
        };

        ServerStats {
            frame_count: self.frame_count,
            skipped_frames: self.skipped_frames,
            avg_frame_time_ms: avg_frame_time,
            phase: self.sim.race().phase(),
        }
    }

    /// Get current race phase
    pub fn get_phase(&self) -> GamePhase {
        self.sim.race().phase()
    }

    /// Back to READY with a fresh simulation
    pub fn reset(&mut self) {
        self.sim = RaceSimulation::new(self.config.clone());
        self.frame_times.clear();
        self.frame_count = 0;
        self.skipped_frames = 0;
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new(RaceConfig::default())
    }
}
