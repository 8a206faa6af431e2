use vecrace_core::geometry::GridPos;
use vecrace_core::player::PlayerId;

use crate::player::Player;
use crate::track::Track;

/// Cells on the integer line from `from` to `to`, both ends included, in
/// travel order (Bresenham).
pub fn line_cells(from: GridPos, to: GridPos) -> Vec<GridPos> {
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - x).abs();
    let dy = -(to.y - y).abs();
    let sx = if x < to.x { 1 } else { -1 };
    let sy = if y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cells = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push(GridPos::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// First solid cell crossed travelling from `from` to `to`, if any.
///
/// The starting cell is sampled too. A fast car can clip a wall mid-segment
/// even when its destination is open.
pub fn trace_wall_collision(track: &Track, from: GridPos, to: GridPos) -> Option<GridPos> {
    line_cells(from, to)
        .into_iter()
        .find(|&cell| track.effective_tile(cell).is_solid())
}

/// Another racing player already parked on `target`.
pub fn find_player_collision(
    players: &[Player],
    mover: PlayerId,
    target: GridPos,
) -> Option<PlayerId> {
    players
        .iter()
        .find(|p| p.id != mover && p.is_racing() && p.motion.position == target)
        .map(|p| p.id)
}
