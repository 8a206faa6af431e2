use serde::{Deserialize, Serialize};
use vecrace_core::geometry::GridPos;
use vecrace_core::player::PlayerId;

use crate::error::MapError;

/// Kind of a grid cell. The first four are permanent; the last two only ever
/// appear as temporary overlays. Serialized as the map-file integers `0..=5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TileKind {
    #[default]
    Empty,
    Wall,
    Start,
    Finish,
    TempWall,
    IceField,
}

impl TileKind {
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Empty | Self::Wall | Self::Start | Self::Finish)
    }

    /// Whether a car crossing this cell crashes.
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Wall | Self::TempWall)
    }

    /// ASCII glyph used by [`Track::from_rows`] and debug dumps.
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Wall => '#',
            Self::Start => 'S',
            Self::Finish => 'F',
            Self::TempWall => 'w',
            Self::IceField => '~',
        }
    }
}

impl TryFrom<u8> for TileKind {
    type Error = MapError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Wall),
            2 => Ok(Self::Start),
            3 => Ok(Self::Finish),
            4 => Ok(Self::TempWall),
            5 => Ok(Self::IceField),
            other => Err(MapError::UnknownTile(other)),
        }
    }
}

impl From<TileKind> for u8 {
    fn from(kind: TileKind) -> u8 {
        match kind {
            TileKind::Empty => 0,
            TileKind::Wall => 1,
            TileKind::Start => 2,
            TileKind::Finish => 3,
            TileKind::TempWall => 4,
            TileKind::IceField => 5,
        }
    }
}

/// Kinds that may be placed as a temporary overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporaryKind {
    TempWall,
    IceField,
}

impl From<TemporaryKind> for TileKind {
    fn from(kind: TemporaryKind) -> TileKind {
        match kind {
            TemporaryKind::TempWall => TileKind::TempWall,
            TemporaryKind::IceField => TileKind::IceField,
        }
    }
}

/// When a temporary tile goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Swept once the global turn counter reaches this value.
    OnTurn(u32),
    /// Lives as long as the owning ability stays active.
    Managed,
}

/// An overlay on top of the permanent grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryTile {
    pub pos: GridPos,
    pub kind: TemporaryKind,
    pub owner: PlayerId,
    pub expiry: Expiry,
    /// Permanent tile underneath at placement time.
    pub underlying: TileKind,
}

/// Map data as authored in JSON map files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub grid: Option<Vec<Vec<u8>>>,
    #[serde(default)]
    pub is_tutorial: bool,
}

impl TrackDefinition {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode `grid` into row-major cells, rejecting anything that does not
    /// match the stated dimensions or is not a permanent tile.
    fn decode(&self) -> Result<Vec<TileKind>, MapError> {
        let grid = self.grid.as_ref().ok_or(MapError::MissingGrid)?;
        if self.width == 0 || self.height == 0 || grid.len() != self.height {
            return Err(MapError::DimensionMismatch {
                width: self.width,
                height: self.height,
                rows: grid.len(),
                bad_row: None,
            });
        }
        let mut cells = Vec::new();
        for (y, row) in grid.iter().enumerate() {
            if row.len() != self.width {
                return Err(MapError::DimensionMismatch {
                    width: self.width,
                    height: self.height,
                    rows: grid.len(),
                    bad_row: Some(y),
                });
            }
            for &v in row {
                let kind = TileKind::try_from(v)?;
                if !kind.is_permanent() {
                    return Err(MapError::UnknownTile(v));
                }
                cells.push(kind);
            }
        }
        Ok(cells)
    }
}

/// The race track: a permanent tile grid plus temporary overlays.
#[derive(Debug, Clone)]
pub struct Track {
    width: usize,
    height: usize,
    cells: Vec<TileKind>,
    temporaries: Vec<TemporaryTile>,
}

impl Default for Track {
    fn default() -> Self {
        Self::new(30, 20)
    }
}

impl Track {
    /// Build the default layout for the given size.
    pub fn new(width: usize, height: usize) -> Self {
        let mut track = Self::bordered(width, height);
        track.apply_default_layout();
        track
    }

    /// An empty grid enclosed by walls.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut track = Self {
            width,
            height,
            cells: vec![TileKind::Empty; width * height],
            temporaries: Vec::new(),
        };
        track.draw_border();
        track
    }

    /// Parse an ASCII layout (`#` wall, `.` empty, `S` start, `F` finish).
    pub fn from_rows(rows: &[&str]) -> Result<Self, MapError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(MapError::DimensionMismatch {
                    width,
                    height,
                    rows: height,
                    bad_row: Some(y),
                });
            }
            for ch in row.chars() {
                cells.push(match ch {
                    '.' | ' ' => TileKind::Empty,
                    '#' => TileKind::Wall,
                    'S' => TileKind::Start,
                    'F' => TileKind::Finish,
                    other => return Err(MapError::Parse(format!("unknown glyph {other:?}"))),
                });
            }
        }
        if width == 0 {
            return Err(MapError::MissingGrid);
        }
        Ok(Self {
            width,
            height,
            cells,
            temporaries: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        self.index(pos).is_some()
    }

    /// Permanent tile at `pos`, ignoring overlays. Out of bounds is Wall.
    pub fn permanent_tile(&self, pos: GridPos) -> TileKind {
        self.index(pos).map_or(TileKind::Wall, |i| self.cells[i])
    }

    /// Editor mutation of the permanent grid. Clears any overlay at `pos`.
    /// Temporary kinds and out-of-bounds positions are ignored.
    pub fn set_permanent_tile(&mut self, pos: GridPos, kind: TileKind) {
        if !kind.is_permanent() {
            return;
        }
        let Some(i) = self.index(pos) else {
            return;
        };
        self.temporaries.retain(|t| t.pos != pos);
        self.cells[i] = kind;
    }

    /// Place an overlay, evicting whatever overlay already sits at `pos`.
    pub fn place_temporary_tile(
        &mut self,
        pos: GridPos,
        kind: TemporaryKind,
        owner: PlayerId,
        expiry: Expiry,
    ) {
        let Some(i) = self.index(pos) else {
            return;
        };
        let underlying = self.cells[i];
        self.temporaries.retain(|t| t.pos != pos);
        self.temporaries.push(TemporaryTile {
            pos,
            kind,
            owner,
            expiry,
            underlying,
        });
    }

    /// Remove the overlay at `pos` if it matches the optional owner and kind
    /// filters. Returns how many overlays were removed.
    pub fn remove_temporary_tile(
        &mut self,
        pos: GridPos,
        owner: Option<PlayerId>,
        kind: Option<TemporaryKind>,
    ) -> usize {
        let before = self.temporaries.len();
        self.temporaries.retain(|t| {
            let matches = t.pos == pos
                && owner.is_none_or(|o| t.owner == o)
                && kind.is_none_or(|k| t.kind == k);
            !matches
        });
        before - self.temporaries.len()
    }

    pub fn temporary_at(&self, pos: GridPos) -> Option<&TemporaryTile> {
        self.temporaries.iter().find(|t| t.pos == pos)
    }

    pub fn temporary_tiles(&self) -> &[TemporaryTile] {
        &self.temporaries
    }

    /// Keep only the overlays matching `keep`. Returns how many were removed.
    pub fn retain_temporary(&mut self, mut keep: impl FnMut(&TemporaryTile) -> bool) -> usize {
        let before = self.temporaries.len();
        self.temporaries.retain(|t| keep(t));
        before - self.temporaries.len()
    }

    pub fn clear_temporary(&mut self) {
        self.temporaries.clear();
    }

    /// Tile that governs movement at `pos` right now.
    pub fn effective_tile(&self, pos: GridPos) -> TileKind {
        let Some(i) = self.index(pos) else {
            return TileKind::Wall;
        };
        match self.temporary_at(pos) {
            Some(t) => t.kind.into(),
            None => self.cells[i],
        }
    }

    /// True iff the permanent grid has at least one Start and one Finish.
    pub fn is_raceable(&self) -> bool {
        self.cells.contains(&TileKind::Start) && self.cells.contains(&TileKind::Finish)
    }

    /// All Start cells in row-major order.
    pub fn start_positions(&self) -> Vec<GridPos> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == TileKind::Start)
            .map(|(i, _)| GridPos::new((i % self.width) as i32, (i / self.width) as i32))
            .collect()
    }

    /// Start cells, or a single point near the top-left when there are none.
    pub fn start_positions_or_fallback(&self) -> Vec<GridPos> {
        let starts = self.start_positions();
        if !starts.is_empty() {
            return starts;
        }
        vec![GridPos::new(
            (self.width / 10).max(1) as i32,
            (self.height / 10).max(1) as i32,
        )]
    }

    /// Restore the default layout at the current size.
    pub fn reset_to_default(&mut self) {
        *self = Self::new(self.width, self.height);
    }

    /// Empty the grid back to just its border.
    pub fn clear(&mut self) {
        *self = Self::bordered(self.width, self.height);
    }

    /// Replace the grid with `def`. Malformed definitions leave a cleared
    /// bordered grid of the current size in place.
    pub fn load_map_data(&mut self, def: &TrackDefinition) -> Result<(), MapError> {
        match def.decode() {
            Ok(cells) => {
                self.width = def.width;
                self.height = def.height;
                self.cells = cells;
                self.temporaries.clear();
                tracing::debug!(map = %def.id, width = def.width, height = def.height, "Map loaded");
                Ok(())
            },
            Err(e) => {
                tracing::warn!(map = %def.id, "Invalid map data ({e}), using cleared track");
                self.clear();
                Err(e)
            },
        }
    }

    /// Permanent grid as map-file rows.
    pub fn to_grid(&self) -> Vec<Vec<TileKind>> {
        self.cells.chunks(self.width.max(1)).map(<[TileKind]>::to_vec).collect()
    }

    /// Effective grid rendered with [`TileKind::glyph`], one string per row.
    pub fn render_rows(&self) -> Vec<String> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.effective_tile(GridPos::new(x, y)).glyph())
                    .collect()
            })
            .collect()
    }

    fn draw_border(&mut self) {
        let (w, h) = (self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    self.cells[y * w + x] = TileKind::Wall;
                }
            }
        }
    }

    fn apply_default_layout(&mut self) {
        let (w, h) = (self.width as i32, self.height as i32);
        if w <= 10 || h <= 10 {
            return;
        }
        self.set_permanent_tile(GridPos::new(2, 2), TileKind::Start);
        self.set_permanent_tile(GridPos::new(3, 2), TileKind::Start);
        self.set_permanent_tile(GridPos::new(w - 3, h - 3), TileKind::Finish);
        self.set_permanent_tile(GridPos::new(w - 4, h - 3), TileKind::Finish);
        if h > 15 {
            let mid = w / 2;
            for y in h * 2 / 10..h * 8 / 10 {
                self.set_permanent_tile(GridPos::new(mid, y), TileKind::Wall);
            }
        }
    }
}
