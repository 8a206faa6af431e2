use crate::track::{TileKind, TrackDefinition};

/// Map the race falls back to when a tutorial ends or no map is chosen.
pub const DEFAULT_MAP_ID: &str = "classic_eight";
pub const TUTORIAL_MAP_ID: &str = "tutorial_map";

/// Scratch grid used to author the built-in maps.
struct GridBuilder {
    width: usize,
    height: usize,
    rows: Vec<Vec<u8>>,
}

impl GridBuilder {
    fn filled(width: usize, height: usize, tile: TileKind) -> Self {
        let v: u8 = tile.into();
        Self {
            width,
            height,
            rows: vec![vec![v; width]; height],
        }
    }

    /// Empty grid with a wall border.
    fn walled(width: usize, height: usize) -> Self {
        let mut g = Self::filled(width, height, TileKind::Empty);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if x == 0 || y == 0 || x == width as i32 - 1 || y == height as i32 - 1 {
                    g.set(x, y, TileKind::Wall);
                }
            }
        }
        g
    }

    fn get(&self, x: i32, y: i32) -> Option<TileKind> {
        let row = self.rows.get(usize::try_from(y).ok()?)?;
        let v = *row.get(usize::try_from(x).ok()?)?;
        TileKind::try_from(v).ok()
    }

    fn set(&mut self, x: i32, y: i32, tile: TileKind) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.rows[y as usize][x as usize] = tile.into();
    }

    fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, tile: TileKind) {
        for r in 0..h {
            for c in 0..w {
                self.set(x + c, y + r, tile);
            }
        }
    }

    fn build(self, id: &str, name: &str, is_tutorial: bool) -> TrackDefinition {
        TrackDefinition {
            id: id.to_string(),
            name: name.to_string(),
            width: self.width,
            height: self.height,
            grid: Some(self.rows),
            is_tutorial,
        }
    }
}

/// Small practice map: a three-cell wall between start and finish.
pub fn tutorial_map() -> TrackDefinition {
    let mut g = GridBuilder::walled(25, 15);
    g.set(2, 7, TileKind::Start);
    g.set(3, 7, TileKind::Start);
    for y in 6..=8 {
        g.set(10, y, TileKind::Wall);
        g.set(22, y, TileKind::Finish);
    }
    g.build(TUTORIAL_MAP_ID, "Game Tutorial", true)
}

/// Figure-eight with a central crossroads.
pub fn classic_eight() -> TrackDefinition {
    let mut g = GridBuilder::walled(35, 25);
    for x in 8..=26 {
        if !(15..=19).contains(&x) {
            g.set(x, 12, TileKind::Wall);
        }
    }
    for y in 5..=19 {
        if !(10..=14).contains(&y) {
            g.set(17, y, TileKind::Wall);
        }
    }
    for (x, y) in [(10, 5), (24, 5), (10, 19), (24, 19)] {
        g.set(x, y, TileKind::Wall);
    }
    for i in 1..5 {
        g.set(10 - i, 5 + i, TileKind::Wall);
        g.set(24 + i, 5 + i, TileKind::Wall);
        g.set(10 - i, 19 - i, TileKind::Wall);
        g.set(24 + i, 19 - i, TileKind::Wall);
    }
    for y in 11..=13 {
        g.set(3, y, TileKind::Start);
        g.set(31, y, TileKind::Finish);
    }
    g.build(DEFAULT_MAP_ID, "The Classic Eight", false)
}

/// Long divider with two gaps and four boulders.
pub fn canyon_chase() -> TrackDefinition {
    let mut g = GridBuilder::walled(40, 20);
    g.rect(5, 9, 30, 2, TileKind::Wall);
    g.rect(15, 9, 2, 2, TileKind::Empty);
    g.rect(25, 9, 2, 2, TileKind::Empty);
    for (x, y) in [(8, 5), (8, 13), (30, 5), (30, 13)] {
        g.rect(x, y, 2, 2, TileKind::Wall);
    }
    g.set(2, 3, TileKind::Start);
    g.set(2, 4, TileKind::Start);
    g.set(37, 15, TileKind::Finish);
    g.set(37, 16, TileKind::Finish);
    g.build("canyon_chase", "Canyon Chase", false)
}

/// Three-by-three city blocks; the middle block is a quarter size.
pub fn urban_gridlock() -> TrackDefinition {
    let mut g = GridBuilder::walled(30, 30);
    for r in 0..3 {
        for c in 0..3 {
            let (top, left) = (5 + r * 8, 5 + c * 8);
            let size = if r == 1 && c == 1 { 2 } else { 4 };
            g.rect(left, top, size, size, TileKind::Wall);
        }
    }
    g.rect(13, 13, 2, 2, TileKind::Empty);
    g.set(14, 2, TileKind::Start);
    g.set(15, 2, TileKind::Start);
    g.set(14, 27, TileKind::Finish);
    g.set(15, 27, TileKind::Finish);
    g.build("urban_gridlock", "Urban Gridlock", false)
}

/// Corridor spiralling clockwise into a finish at the centre.
pub fn spiral_ascent() -> TrackDefinition {
    const SIZE: usize = 25;
    let mut g = GridBuilder::filled(SIZE, SIZE, TileKind::Wall);
    let (mut x, mut y) = (1i32, 1i32);
    let (mut dx, mut dy) = (1i32, 0i32);
    let mut segment = 23;
    let mut walked = 0;
    let mut turns = 0;
    let mut steps = 0;
    while segment > 1 && steps < 500 {
        steps += 1;
        if g.get(x, y).is_none() {
            break;
        }
        g.set(x, y, TileKind::Empty);
        walked += 1;
        if walked >= segment {
            walked = 0;
            turns += 1;
            (dx, dy) = (-dy, dx);
            if turns % 2 == 0 {
                segment -= 2;
            }
        }
        x += dx;
        y += dy;
    }
    for (sx, sy) in [(1, 1), (2, 1), (1, 2)] {
        g.set(sx, sy, TileKind::Start);
    }
    let c = (SIZE / 2) as i32;
    g.set(c, c, TileKind::Finish);
    for (nx, ny) in [(c, c - 1), (c, c + 1), (c - 1, c), (c + 1, c)] {
        if g.get(nx, ny) == Some(TileKind::Empty) {
            g.set(nx, ny, TileKind::Finish);
        }
    }
    g.build("spiral_ascent", "Spiral Ascent", false)
}

/// Islands joined by narrow bridges.
pub fn island_hop() -> TrackDefinition {
    let mut g = GridBuilder::filled(38, 22, TileKind::Wall);
    for (x, y, w, h) in [
        (2, 2, 8, 8),
        (15, 2, 8, 6),
        (28, 2, 8, 8),
        (2, 12, 6, 8),
        (16, 14, 6, 6),
        (28, 12, 8, 8),
    ] {
        g.rect(x, y, w, h, TileKind::Empty);
    }
    for (x, y, len) in [(10, 5, 5), (23, 5, 5), (8, 16, 8), (22, 16, 6)] {
        g.rect(x, y, len, 1, TileKind::Empty);
    }
    for (x, y, len) in [(5, 10, 2), (18, 8, 6), (31, 10, 2)] {
        g.rect(x, y, 1, len, TileKind::Empty);
    }
    for (sx, sy) in [(3, 3), (3, 4), (4, 3)] {
        g.set(sx, sy, TileKind::Start);
    }
    for (fx, fy) in [(33, 17), (33, 18), (32, 17)] {
        g.set(fx, fy, TileKind::Finish);
    }
    g.build("island_hop", "Island Hop", false)
}

/// Every built-in map, tutorial first.
pub fn all_maps() -> Vec<TrackDefinition> {
    vec![
        tutorial_map(),
        classic_eight(),
        canyon_chase(),
        urban_gridlock(),
        spiral_ascent(),
        island_hop(),
    ]
}

pub fn find_map(id: &str) -> Option<TrackDefinition> {
    all_maps().into_iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::track::Track;
    use vecrace_core::geometry::GridPos;

    #[test]
    fn all_maps_load_and_are_raceable() {
        for def in all_maps() {
            let mut track = Track::default();
            assert!(track.load_map_data(&def).is_ok(), "{} failed to load", def.id);
            assert!(track.is_raceable(), "{} has no start or finish", def.id);
            assert_eq!((track.width(), track.height()), (def.width, def.height));
        }
    }

    #[test]
    fn all_maps_have_unique_ids() {
        let maps = all_maps();
        let ids: HashSet<&str> = maps.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), maps.len());
    }

    #[test]
    fn only_the_tutorial_is_flagged() {
        let flagged: Vec<_> = all_maps()
            .into_iter()
            .filter(|m| m.is_tutorial)
            .map(|m| m.id)
            .collect();
        assert_eq!(flagged, vec![TUTORIAL_MAP_ID.to_string()]);
    }

    #[test]
    fn tutorial_layout() {
        let mut track = Track::default();
        track.load_map_data(&tutorial_map()).unwrap();
        assert_eq!(
            track.start_positions(),
            vec![GridPos::new(2, 7), GridPos::new(3, 7)]
        );
        assert_eq!(track.permanent_tile(GridPos::new(10, 6)), TileKind::Wall);
        assert_eq!(track.permanent_tile(GridPos::new(22, 8)), TileKind::Finish);
        assert_eq!(track.permanent_tile(GridPos::new(7, 7)), TileKind::Empty);
    }

    #[test]
    fn spiral_finish_is_reachable_corridor() {
        let mut track = Track::default();
        track.load_map_data(&spiral_ascent()).unwrap();
        assert_eq!(track.permanent_tile(GridPos::new(12, 12)), TileKind::Finish);
        assert_eq!(track.permanent_tile(GridPos::new(1, 1)), TileKind::Start);
        assert_eq!(track.permanent_tile(GridPos::new(5, 1)), TileKind::Empty);
        assert_eq!(track.permanent_tile(GridPos::new(0, 0)), TileKind::Wall);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_map(DEFAULT_MAP_ID).map(|m| m.width), Some(35));
        assert!(find_map("nowhere").is_none());
    }
}
