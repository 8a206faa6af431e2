use serde::{Deserialize, Serialize};

/// Integer cell coordinate on the track grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a real-valued coordinate (floor on both axes).
    pub fn from_cell_coords(x: f32, y: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Cell under a pixel coordinate for a renderer drawing `cell_size` pixels per cell.
    pub fn from_pixels(px: f32, py: f32, cell_size: f32) -> Self {
        if cell_size <= 0.0 {
            return Self::from_cell_coords(px, py);
        }
        Self::from_cell_coords(px / cell_size, py / cell_size)
    }

    pub fn offset(self, v: Vec2i) -> Self {
        Self {
            x: self.x + v.dx,
            y: self.y + v.dy,
        }
    }

    /// Step `n` cells along `v`.
    pub fn step(self, v: Vec2i, n: i32) -> Self {
        Self {
            x: self.x + v.dx * n,
            y: self.y + v.dy * n,
        }
    }

    /// Vector from `self` to `other`.
    pub fn delta_to(self, other: GridPos) -> Vec2i {
        Vec2i::new(other.x - self.x, other.y - self.y)
    }

    /// Euclidean distance in cells.
    pub fn distance_to(self, other: GridPos) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Integer velocity / acceleration vector in cells per turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2i {
    pub dx: i32,
    pub dy: i32,
}

impl Vec2i {
    pub const ZERO: Vec2i = Vec2i { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    pub fn signum(self) -> Self {
        Self {
            dx: self.dx.signum(),
            dy: self.dy.signum(),
        }
    }

    /// Heading in radians (0 = +X, grid Y grows downward).
    pub fn angle(self) -> f32 {
        (self.dy as f32).atan2(self.dx as f32)
    }

    /// Sign-reversed unit direction, collapsed onto the dominant axis when the
    /// magnitudes differ. Equal magnitudes keep the diagonal.
    pub fn reverse_dominant(self) -> Self {
        let mut back = Self {
            dx: -self.dx.signum(),
            dy: -self.dy.signum(),
        };
        if self.dx.abs() < self.dy.abs() {
            back.dx = 0;
        } else if self.dy.abs() < self.dx.abs() {
            back.dy = 0;
        }
        back
    }
}

impl std::ops::Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Vec2i {
        Vec2i::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl std::ops::AddAssign for Vec2i {
    fn add_assign(&mut self, rhs: Vec2i) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_coords_floor_negative_values() {
        assert_eq!(GridPos::from_cell_coords(2.7, -0.2), GridPos::new(2, -1));
    }

    #[test]
    fn pixels_map_to_cells() {
        assert_eq!(GridPos::from_pixels(45.0, 19.9, 20.0), GridPos::new(2, 0));
    }

    #[test]
    fn distance_is_euclidean() {
        let d = GridPos::new(0, 0).distance_to(GridPos::new(3, 4));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn reverse_dominant_prefers_larger_axis() {
        assert_eq!(Vec2i::new(3, 1).reverse_dominant(), Vec2i::new(-1, 0));
        assert_eq!(Vec2i::new(-1, 4).reverse_dominant(), Vec2i::new(0, -1));
        assert_eq!(Vec2i::new(2, -2).reverse_dominant(), Vec2i::new(-1, 1));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn distance_is_symmetric(
                ax in -500i32..500, ay in -500i32..500,
                bx in -500i32..500, by in -500i32..500,
            ) {
                let (a, b) = (GridPos::new(ax, ay), GridPos::new(bx, by));
                prop_assert_eq!(a.distance_to(b), b.distance_to(a));
                prop_assert_eq!(a.offset(a.delta_to(b)), b);
            }

            #[test]
            fn reverse_dominant_is_a_unit_step_against_travel(dx in -50i32..50, dy in -50i32..50) {
                let v = Vec2i::new(dx, dy);
                let back = v.reverse_dominant();
                prop_assert!(back.dx.abs() <= 1 && back.dy.abs() <= 1);
                prop_assert_eq!(back.is_zero(), v.is_zero());
                prop_assert!(back.dx * v.dx <= 0 && back.dy * v.dy <= 0);
                if dx.abs() != dy.abs() {
                    prop_assert!(back.dx == 0 || back.dy == 0);
                }
            }
        }
    }
}
