//! Game Server Module
//!
//! Single-player 100m sprint: input sampling, the race state machine,
//! locomotion, run-cycle animation, the follow camera and progress
//! tracking, driven once per frame by the host render loop.

pub mod animation;
pub mod camera;
pub mod input;
pub mod locomotion;
pub mod physics;
pub mod race;
pub mod simulation;
pub mod state_machine;
pub mod track;
pub mod tracker;

pub use input::{Control, InputSampler};
pub use physics::{BodyState, PhysicsBody, PlayerTransform};
pub use race::{GamePhase, RaceConfig, RaceSnapshot, RaceState};
pub use simulation::{FrameOutput, GameServer, RaceSimulation};
