use serde::{Deserialize, Serialize};
use vecrace_core::events::RaceMode;
use vecrace_core::geometry::Vec2i;

use crate::engine::RaceEngine;
use crate::maps;

/// A host input, serializable so scripted sessions can be replayed from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum RaceCommand {
    Accelerate { dx: i32, dy: i32 },
    ActivateAbility { index: usize },
    /// Target in cell units (fractional values pick the containing cell).
    SubmitTarget { x: f32, y: f32 },
    CancelTargeting,
    RequestHint,
    ResetRace,
    SwitchMode { mode: RaceMode },
    AddPlayer,
    RemovePlayer,
    LoadMap { id: String },
}

impl RaceCommand {
    /// Feed this command to `engine`. Rejections are logged, not returned:
    /// the engine already reports them through events and notices.
    pub fn apply(&self, engine: &mut RaceEngine) {
        match self {
            Self::Accelerate { dx, dy } => engine.attempt_move(Vec2i::new(*dx, *dy)),
            Self::ActivateAbility { index } => {
                if let Err(e) = engine.activate_ability(*index) {
                    tracing::debug!(index, error = %e, "Ability command rejected");
                }
            },
            Self::SubmitTarget { x, y } => {
                if let Err(e) = engine.submit_target(*x, *y) {
                    tracing::debug!(x, y, error = %e, "Target rejected");
                }
            },
            Self::CancelTargeting => engine.cancel_targeting(),
            Self::RequestHint => {
                engine.request_hint();
            },
            Self::ResetRace => {
                if let Err(e) = engine.reset_race() {
                    tracing::debug!(error = %e, "Reset rejected");
                }
            },
            Self::SwitchMode { mode } => {
                if let Err(e) = engine.switch_mode(*mode) {
                    tracing::debug!(error = %e, "Mode switch rejected");
                }
            },
            Self::AddPlayer => {
                engine.add_player();
            },
            Self::RemovePlayer => {
                engine.remove_player();
            },
            Self::LoadMap { id } => match maps::find_map(id) {
                Some(def) => {
                    if let Err(e) = engine.load_map_data(&def) {
                        tracing::warn!(map = %id, error = %e, "Map failed to load");
                    }
                },
                None => tracing::warn!(map = %id, "Unknown map"),
            },
        }
    }

    /// Parse a JSON array of commands.
    pub fn parse_script(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}
