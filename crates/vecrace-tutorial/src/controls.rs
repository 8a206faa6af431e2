use serde::{Deserialize, Serialize};
use vecrace_core::events::AbilityKind;
use vecrace_engine::RaceEngine;
use vecrace_engine::command::RaceCommand;

/// A host UI control the tutorial can enable or disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "control")]
pub enum Control {
    /// One button of the 3x3 acceleration grid; (0, 0) is Coast.
    Accelerate { dx: i32, dy: i32 },
    Ability { kind: AbilityKind },
    Hint,
    CancelTargeting,
    TutorialNext,
    MapSelector,
    EditorMode,
    Reset,
    PlayerCount,
    TutorialPanel,
}

impl Control {
    pub const COAST: Self = Self::Accelerate { dx: 0, dy: 0 };

    /// All nine acceleration buttons, row by row.
    pub fn acceleration_grid() -> impl Iterator<Item = Self> {
        (-1..=1).flat_map(|dy| (-1..=1).map(move |dx| Self::Accelerate { dx, dy }))
    }

    /// Control a command is issued from. `None` when the command names an
    /// ability slot the active player does not have.
    pub fn for_command(command: &RaceCommand, engine: &RaceEngine) -> Option<Self> {
        let ability_at = |index: usize| {
            engine
                .current_player()
                .and_then(|p| p.abilities.get(index))
                .map(|a| Self::Ability { kind: a.kind })
        };
        match command {
            RaceCommand::Accelerate { dx, dy } => Some(Self::Accelerate {
                dx: dx.signum(),
                dy: dy.signum(),
            }),
            RaceCommand::ActivateAbility { index } => ability_at(*index),
            RaceCommand::SubmitTarget { .. } => engine.targeting().and_then(ability_at),
            RaceCommand::CancelTargeting => Some(Self::CancelTargeting),
            RaceCommand::RequestHint => Some(Self::Hint),
            RaceCommand::ResetRace => Some(Self::Reset),
            RaceCommand::SwitchMode { .. } => Some(Self::EditorMode),
            RaceCommand::AddPlayer | RaceCommand::RemovePlayer => Some(Self::PlayerCount),
            RaceCommand::LoadMap { .. } => Some(Self::MapSelector),
        }
    }
}

/// Which controls are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAccess {
    #[default]
    All,
    /// Strict allow-list: everything else is disabled.
    Only(Vec<Control>),
}

impl ControlAccess {
    pub fn only(controls: impl IntoIterator<Item = Control>) -> Self {
        Self::Only(controls.into_iter().collect())
    }

    pub fn allows(&self, control: Option<Control>) -> bool {
        match (self, control) {
            (Self::All, _) => true,
            (Self::Only(list), Some(c)) => list.contains(&c),
            (Self::Only(_), None) => false,
        }
    }
}

/// What the host should draw attention to during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "target")]
pub enum Highlight {
    Control { control: Control },
    SpeedReadout,
    VelocityVector,
}
