/// Why an ability could not take effect. None of these consume a charge.
#[derive(Debug, Clone, PartialEq)]
pub enum AbilityError {
    /// A targeting ability was activated without a target cell.
    MissingTarget,
    /// No cell around the player or target qualified for placement.
    NoValidCell,
    OutOfRange {
        distance: f32,
        max: f32,
    },
    /// No charges left, already active, or the player is out of the turn.
    Unavailable,
}

impl std::fmt::Display for AbilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "No target selected"),
            Self::NoValidCell => write!(f, "No space to deploy"),
            Self::OutOfRange { distance, max } => {
                write!(f, "Target out of range ({distance:.1} > {max:.1})")
            },
            Self::Unavailable => write!(f, "Ability not available"),
        }
    }
}

impl std::error::Error for AbilityError {}

/// A track or seat configuration that cannot host a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    MissingStartOrFinish,
    NoPlayers,
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingStartOrFinish => write!(f, "Track is missing Start or Finish tiles"),
            Self::NoPlayers => write!(f, "No players to race"),
        }
    }
}

impl std::error::Error for SetupError {}

/// Map data rejected by [`crate::track::Track::load_map_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    MissingGrid,
    DimensionMismatch {
        width: usize,
        height: usize,
        rows: usize,
        bad_row: Option<usize>,
    },
    UnknownTile(u8),
    Parse(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGrid => write!(f, "map data has no grid"),
            Self::DimensionMismatch {
                width,
                height,
                rows,
                bad_row,
            } => match bad_row {
                Some(row) => write!(f, "row {row} is not {width} cells wide"),
                None => write!(f, "expected {height} rows, found {rows}"),
            },
            Self::UnknownTile(v) => write!(f, "unknown tile value {v}"),
            Self::Parse(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for MapError {}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
