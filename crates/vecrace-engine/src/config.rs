use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Seat limits and per-player allowances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    pub min_players: usize,
    pub max_players: usize,
    /// Hints each player starts a race with.
    pub max_hints: u32,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 5,
            max_hints: 3,
        }
    }
}

/// Track dimension limits for the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub min_size: usize,
    pub max_width: usize,
    pub max_height: usize,
    pub default_width: usize,
    pub default_height: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            min_size: 10,
            max_width: 100,
            max_height: 60,
            default_width: 30,
            default_height: 20,
        }
    }
}

/// Car handling on special surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fraction of a requested acceleration that takes effect on ice.
    pub ice_damping: f32,
    /// Fraction of existing velocity carried as extra momentum when coasting on ice.
    pub ice_continuation: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ice_damping: 0.4,
            ice_continuation: 0.3,
        }
    }
}

/// Real-time pacing for player feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub crash_reset_delay_ms: u64,
    pub hint_duration_ms: u64,
    pub notice_duration_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            crash_reset_delay_ms: 1500,
            hint_duration_ms: 2000,
            notice_duration_ms: 2000,
        }
    }
}

impl TimingConfig {
    pub fn crash_reset_delay(&self) -> Duration {
        Duration::from_millis(self.crash_reset_delay_ms)
    }

    pub fn hint_duration(&self) -> Duration {
        Duration::from_millis(self.hint_duration_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

/// Ability tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Charges every ability starts a race with.
    pub charges: u32,
    /// Cells in a Rear Guard wall.
    pub rear_wall_length: i32,
    /// Turns a Rear Guard wall stands.
    pub rear_wall_duration_turns: u32,
    /// Max Euclidean distance (cells) from the car to an Ice Slick target.
    pub ice_place_radius: f32,
    /// Half-width of the Ice Slick square (1 = 3x3).
    pub ice_size_radius: i32,
    /// Ice Slick lifetime in full rounds; scaled by player count.
    pub ice_base_rounds: u32,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            charges: 1,
            rear_wall_length: 2,
            rear_wall_duration_turns: 5,
            ice_place_radius: 6.0,
            ice_size_radius: 1,
            ice_base_rounds: 3,
        }
    }
}

/// Tutorial placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    pub start_x: i32,
    pub start_y: i32,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            start_x: 7,
            start_y: 7,
        }
    }
}

/// Top-level race configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub players: PlayersConfig,
    pub track: TrackConfig,
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub abilities: AbilityConfig,
    pub tutorial: TutorialConfig,
}

impl RaceConfig {
    /// Load config from the TOML file named by `VECRACE_CONFIG` (default
    /// `config/race.toml`). Falls back to defaults if the file is missing or
    /// unparseable.
    pub fn load() -> Self {
        let path =
            std::env::var("VECRACE_CONFIG").unwrap_or_else(|_| "config/race.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
