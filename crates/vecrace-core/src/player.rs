use rand::Rng;
use serde::{Deserialize, Serialize};

/// Seat index of a racer: 0-based, stable for the life of a race setup, used
/// both as an array index and as the owner key on temporary tiles.
pub type PlayerId = usize;

/// Car colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// Base colours handed out in seat order.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor {
            r: 0,
            g: 123,
            b: 255,
        }, // Blue
        PlayerColor {
            r: 220,
            g: 53,
            b: 69,
        }, // Red
        PlayerColor {
            r: 40,
            g: 167,
            b: 69,
        }, // Green
        PlayerColor {
            r: 255,
            g: 193,
            b: 7,
        }, // Amber
        PlayerColor {
            r: 111,
            g: 66,
            b: 193,
        }, // Purple
    ];

    /// A dark-ish random colour for seats beyond the palette.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self {
            r: rng.random_range(0..200),
            g: rng.random_range(0..200),
            b: rng.random_range(0..200),
        }
    }

    /// Palette colour for `seat`, or a random colour once the palette runs out.
    pub fn for_seat(seat: usize) -> Self {
        Self::PALETTE
            .get(seat)
            .copied()
            .unwrap_or_else(Self::random)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
