use serde::{Deserialize, Serialize};

use crate::geometry::{GridPos, Vec2i};
use crate::player::PlayerId;

/// The three ability variants a car can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    InstaStop,
    RearGuard,
    IceSlick,
}

/// Whether the surrounding application is editing the track or racing on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceMode {
    Editing,
    #[default]
    Racing,
}

/// What a crashing car ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CrashCause {
    Wall,
    Player { other: PlayerId },
}

/// One row of the final leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub moves: u32,
}

/// Outcome events emitted by the race engine after each entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RaceEvent {
    Moved {
        player_id: PlayerId,
        from: GridPos,
        to: GridPos,
        input: Vec2i,
    },
    Crashed {
        player_id: PlayerId,
        site: GridPos,
        cause: CrashCause,
    },
    /// Cosmetic burst for the renderer (crash sites and finish line).
    Explosion {
        player_id: PlayerId,
        at: GridPos,
    },
    Finished {
        player_id: PlayerId,
        moves: u32,
    },
    AbilityUsed {
        player_id: PlayerId,
        ability: AbilityKind,
    },
    AbilityFailed {
        player_id: PlayerId,
        ability: AbilityKind,
        reason: String,
    },
    TargetingStarted {
        player_id: PlayerId,
        ability: AbilityKind,
    },
    TargetingCancelled {
        player_id: PlayerId,
    },
    TurnAdvanced {
        player_id: PlayerId,
        turn: u32,
    },
    CrashReset {
        player_ids: Vec<PlayerId>,
    },
    RaceComplete {
        ranking: Vec<RankEntry>,
    },
    ModeChanged {
        mode: RaceMode,
    },
    HintShown {
        player_id: PlayerId,
        predicted: GridPos,
    },
}

/// Coarse classification of the last thing the driver did, as seen by the
/// tutorial's completion predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Accelerated,
    AbilityUsed,
    Crashed,
    Finished,
    NextClicked,
}

impl ActionKind {
    /// Classify a single event. Events without a driver-facing meaning map to `None`.
    pub fn from_event(event: &RaceEvent) -> Option<Self> {
        match event {
            RaceEvent::Moved { .. } => Some(Self::Accelerated),
            RaceEvent::AbilityUsed { .. } => Some(Self::AbilityUsed),
            RaceEvent::Crashed { .. } => Some(Self::Crashed),
            RaceEvent::Finished { .. } => Some(Self::Finished),
            _ => None,
        }
    }

    /// Most significant classification in a batch of events: a finish or crash
    /// outranks the move that caused it.
    pub fn summarize(events: &[RaceEvent]) -> Option<Self> {
        let kinds: Vec<Self> = events.iter().filter_map(Self::from_event).collect();
        [
            Self::Finished,
            Self::Crashed,
            Self::AbilityUsed,
            Self::Accelerated,
        ]
        .into_iter()
        .find(|k| kinds.contains(k))
    }
}
