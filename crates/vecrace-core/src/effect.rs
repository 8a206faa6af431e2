use serde::{Deserialize, Serialize};

/// Countdown for a timed effect, measured in completed turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCountdown {
    pub total: u32,
    pub remaining: u32,
}

impl TurnCountdown {
    pub fn new(turns: u32) -> Self {
        Self {
            total: turns,
            remaining: turns,
        }
    }

    /// Count one turn down. Returns true when this tick reached zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
