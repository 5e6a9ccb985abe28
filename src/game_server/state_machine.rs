//! State Machine - READY -> (SET) -> RACING -> FINISHED -> READY
//!
//! Input edges drive the start and restart transitions, the tracker drives
//! the finish. Edges that do not match the current phase are dropped.

use std::time::{Duration, Instant};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game_server::input::{Control, ControlSample};
use crate::game_server::physics::{PhysicsBody, PlayerTransform};
use crate::game_server::race::{format_race_time, GamePhase, RaceConfig, RaceState};

/// Randomized hold between "set" and the gun, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetHold {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl SetHold {
    fn draw(&self, rng: &mut StdRng) -> Duration {
        let lo = self.min_ms.min(self.max_ms);
        let hi = self.min_ms.max(self.max_ms);
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

/// Transition taken this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// READY -> SET
    Set,
    /// READY/SET -> RACING
    Go,
    /// RACING -> FINISHED
    Finish,
    /// FINISHED/SET -> READY
    Reset,
}

/// Owns every phase change of the race state
pub struct GameStateMachine {
    set_hold: Option<SetHold>,
    start_block: Vec3,
    rng: StdRng,
}

impl GameStateMachine {
    /// State machine with an entropy-seeded SET hold
    pub fn new(config: &RaceConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// State machine drawing SET holds from `rng`
    pub fn with_rng(config: &RaceConfig, rng: StdRng) -> Self {
        Self {
            set_hold: config.set_hold,
            start_block: config.starting_block(),
            rng,
        }
    }

    /// Apply this frame's input edges and the SET timer
    pub fn update(
        &mut self,
        race: &mut RaceState,
        sample: &ControlSample,
        now: Instant,
        body: &mut dyn PhysicsBody,
    ) -> Option<Transition> {
        let start = sample.was_pressed(Control::Start);
        let restart = sample.was_pressed(Control::Restart);

        match race.phase() {
            GamePhase::Ready if start => {
                self.reset_player(race, body);
                match self.set_hold {
                    Some(hold) => {
                        let wait = hold.draw(&mut self.rng);
                        race.enter_set(now + wait);
                        log::info!("Set: gun in {} ms", wait.as_millis());
                        Some(Transition::Set)
                    }
                    None => {
                        race.enter_racing(now);
                        log::info!("Race started");
                        Some(Transition::Go)
                    }
                }
            }
            GamePhase::Set if restart => {
                race.enter_ready();
                self.reset_player(race, body);
                log::info!("Start aborted");
                Some(Transition::Reset)
            }
            GamePhase::Set if race.set_deadline().map_or(true, |d| now >= d) => {
                race.enter_racing(now);
                log::info!("Race started");
                Some(Transition::Go)
            }
            GamePhase::Finished if restart => {
                race.enter_ready();
                self.reset_player(race, body);
                log::info!("Race reset");
                Some(Transition::Reset)
            }
            phase => {
                if start || restart {
                    log::debug!("Ignoring start/restart in {:?}", phase);
                }
                None
            }
        }
    }

    /// Called by the progress tracker when the finish line is crossed
    pub fn finish(&mut self, race: &mut RaceState, now: Instant) -> Option<Transition> {
        if !race.enter_finished(now) {
            return None;
        }
        if let Some(elapsed) = race.elapsed(now) {
            log::info!("Race finished in {}", format_race_time(elapsed));
        }
        Some(Transition::Finish)
    }

    fn reset_player(&self, race: &mut RaceState, body: &mut dyn PhysicsBody) {
        body.reset_to(self.start_block);
        race.mirror_player(PlayerTransform::at(self.start_block));
    }
}
