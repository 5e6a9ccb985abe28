//! 100M Sprint - Race simulation core and Tauri backend
//!
//! The frontend owns rendering and the physics engine; every frame it sends
//! the player's body state and gets back the velocity override, limb pose,
//! camera placement and race state.

pub mod game_server;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Mutex;

    use serde::Serialize;
    use tauri::State;

    use crate::game_server::race::{GamePhase, RaceConfig, RaceSnapshot};
    use crate::game_server::simulation::{FrameOutput, GameServer, ServerStats};
    use crate::game_server::BodyState;

    /// Reply to a frame: the outputs plus the body as the simulation left it
    #[derive(Debug, Serialize)]
    struct FrameReply {
        frame: FrameOutput,
        body: Option<BodyState>,
    }

    /// Rebuild the race, optionally from a JSON config
    #[tauri::command]
    fn init_race(server: State<'_, Mutex<GameServer>>, config: Option<String>) -> Result<(), String> {
        let config = match config {
            Some(json) => RaceConfig::from_json(&json).map_err(|e| e.to_string())?,
            None => RaceConfig::default(),
        };
        let mut server = server.lock().map_err(|e| e.to_string())?;
        log::info!(
            "Race initialized: {}m from z={} in lane {}",
            config.track.distance,
            config.track.start,
            config.start_lane + 1
        );
        server.init_race(config);
        Ok(())
    }

    #[tauri::command]
    fn key_down(server: State<'_, Mutex<GameServer>>, key: String) -> Result<bool, String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.key_down(&key))
    }

    #[tauri::command]
    fn key_up(server: State<'_, Mutex<GameServer>>, key: String) -> Result<bool, String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.key_up(&key))
    }

    /// Drop held keys, e.g. on window blur
    #[tauri::command]
    fn release_keys(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.release_keys();
        Ok(())
    }

    /// Advance one frame
    #[tauri::command]
    fn frame(
        server: State<'_, Mutex<GameServer>>,
        body: Option<BodyState>,
    ) -> Result<FrameReply, String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        let (frame, body) = server.frame(body);
        Ok(FrameReply { frame, body })
    }

    /// Get current race snapshot without advancing
    #[tauri::command]
    fn get_snapshot(server: State<'_, Mutex<GameServer>>) -> Result<RaceSnapshot, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_snapshot())
    }

    /// Get server statistics
    #[tauri::command]
    fn get_stats(server: State<'_, Mutex<GameServer>>) -> Result<ServerStats, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_stats())
    }

    #[tauri::command]
    fn get_phase(server: State<'_, Mutex<GameServer>>) -> Result<GamePhase, String> {
        let server = server.lock().map_err(|e| e.to_string())?;
        Ok(server.get_phase())
    }

    /// Reset to READY
    #[tauri::command]
    fn reset_race(server: State<'_, Mutex<GameServer>>) -> Result<(), String> {
        let mut server = server.lock().map_err(|e| e.to_string())?;
        server.reset();
        log::info!("Race reset");
        Ok(())
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tauri::Builder::default()
            .manage(Mutex::new(GameServer::default()))
            .setup(|app| {
                if cfg!(debug_assertions) {
                    app.handle().plugin(
                        tauri_plugin_log::Builder::default()
                            .level(log::LevelFilter::Info)
                            .build(),
                    )?;
                }
                log::info!("Sprint game server initialized");
                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                init_race,
                key_down,
                key_up,
                release_keys,
                frame,
                get_snapshot,
                get_stats,
                get_phase,
                reset_race,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
