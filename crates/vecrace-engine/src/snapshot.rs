use serde::{Deserialize, Serialize};
use vecrace_core::events::{AbilityKind, RaceMode, RankEntry};
use vecrace_core::geometry::{GridPos, Vec2i};
use vecrace_core::player::PlayerId;

use crate::abilities::Ability;
use crate::engine::RaceEngine;
use crate::player::Player;
use crate::track::{TemporaryTile, TileKind};

/// Read-only view of one ability slot for a HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityView {
    pub kind: AbilityKind,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub charges: u32,
    pub max_charges: u32,
    pub active: bool,
    /// Turns left on an active timed effect.
    pub turns_remaining: u32,
}

/// Read-only view of a car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub position: GridPos,
    pub velocity: Vec2i,
    pub path: Vec<GridPos>,
    pub heading: f32,
    pub crashed: bool,
    pub finished: bool,
    pub on_ice: bool,
    pub moves: u32,
    pub hints_remaining: u32,
    pub abilities: Vec<AbilityView>,
}

/// Range circle drawn while an area ability waits for a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingPreview {
    pub player_id: PlayerId,
    pub ability: AbilityKind,
    pub center: GridPos,
    pub radius: f32,
}

/// Predicted-move arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintArrow {
    pub player_id: PlayerId,
    pub from: GridPos,
    pub to: GridPos,
}

/// Everything a renderer needs to draw one frame, serializable as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub map_id: String,
    pub map_name: String,
    pub mode: RaceMode,
    pub complete: bool,
    pub turn: u32,
    pub current_player: Option<PlayerId>,
    pub width: usize,
    pub height: usize,
    /// Permanent grid, row-major.
    pub grid: Vec<Vec<TileKind>>,
    pub temporary_tiles: Vec<TemporaryTile>,
    pub players: Vec<PlayerView>,
    pub targeting: Option<TargetingPreview>,
    pub hint: Option<HintArrow>,
    pub notices: Vec<String>,
    pub ranking: Vec<RankEntry>,
    pub crash_reset_pending: bool,
}

impl RaceSnapshot {
    pub fn capture(engine: &RaceEngine) -> Self {
        let config = &engine.config().abilities;
        let ability_view = |a: &Ability| AbilityView {
            kind: a.kind,
            name: a.name().to_string(),
            icon: a.icon().to_string(),
            description: a.description(config),
            charges: a.current_charges,
            max_charges: a.max_charges,
            active: a.is_active,
            turns_remaining: a.countdown.remaining,
        };
        let player_view = |p: &Player| PlayerView {
            id: p.id,
            name: p.name.clone(),
            color: p.color.to_hex(),
            position: p.motion.position,
            velocity: p.motion.velocity,
            path: p.motion.path.clone(),
            heading: p.motion.last_angle,
            crashed: p.crashed,
            finished: p.finished,
            on_ice: p.motion.on_ice,
            moves: p.moves_made,
            hints_remaining: p.hints_remaining,
            abilities: p.abilities.iter().map(ability_view).collect(),
        };

        let targeting = engine.targeting().and_then(|index| {
            let player = engine.current_player()?;
            let ability = player.abilities.get(index)?;
            Some(TargetingPreview {
                player_id: player.id,
                ability: ability.kind,
                center: player.motion.position,
                radius: ability.target_range(config).unwrap_or(0.0),
            })
        });

        let track = engine.track();
        Self {
            map_id: engine.map().id.clone(),
            map_name: engine.map().name.clone(),
            mode: engine.mode(),
            complete: engine.is_complete(),
            turn: engine.turn(),
            current_player: engine.current_player_id(),
            width: track.width(),
            height: track.height(),
            grid: track.to_grid(),
            temporary_tiles: track.temporary_tiles().to_vec(),
            players: engine.players().iter().map(player_view).collect(),
            targeting,
            hint: engine.hint().map(|h| HintArrow {
                player_id: h.player_id,
                from: h.from,
                to: h.to,
            }),
            notices: engine.notices().iter().map(|n| n.text.clone()).collect(),
            ranking: engine.ranking().to_vec(),
            crash_reset_pending: engine.crash_reset_pending(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaceConfig;

    #[test]
    fn snapshot_mirrors_engine() {
        let engine = RaceEngine::with_config(RaceConfig::default());
        let snap = engine.snapshot();
        assert_eq!(snap.mode, RaceMode::Racing);
        assert_eq!((snap.width, snap.height), (30, 20));
        assert_eq!(snap.grid.len(), 20);
        assert_eq!(snap.grid[2][2], TileKind::Start);
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].color, "#007bff");
        assert_eq!(snap.players[0].abilities.len(), 3);
        assert!(snap.targeting.is_none());
    }

    #[test]
    fn targeting_preview_shows_range() {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        engine.activate_ability(2).unwrap();
        let preview = engine.snapshot().targeting.unwrap();
        assert_eq!(preview.ability, AbilityKind::IceSlick);
        assert_eq!(preview.center, GridPos::new(2, 2));
        assert_eq!(preview.radius, 6.0);
    }

    #[test]
    fn snapshot_serializes_tiles_as_numbers() {
        let engine = RaceEngine::with_config(RaceConfig::default());
        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert_eq!(json["grid"][0][0], 1);
        assert_eq!(json["mode"], serde_json::json!("racing"));
    }
}
