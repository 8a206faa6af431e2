use vecrace_core::geometry::GridPos;
use vecrace_core::player::PlayerId;

use super::AbilityContext;
use crate::error::AbilityError;
use crate::track::{Expiry, TemporaryKind, TileKind, Track};

/// Ice the square around `target`. A cell qualifies when its permanent tile
/// is Empty and nothing but ice already covers it. Returns the placed cells.
pub(super) fn activate(
    target: GridPos,
    ctx: &mut AbilityContext<'_>,
) -> Result<Vec<GridPos>, AbilityError> {
    let r = ctx.config.ice_size_radius;
    let mut cells = Vec::new();
    for dx in -r..=r {
        for dy in -r..=r {
            let cell = GridPos::new(target.x + dx, target.y + dy);
            if ctx.track.permanent_tile(cell) != TileKind::Empty {
                continue;
            }
            if matches!(
                ctx.track.effective_tile(cell),
                TileKind::Empty | TileKind::IceField
            ) {
                cells.push(cell);
            }
        }
    }
    if cells.is_empty() {
        return Err(AbilityError::NoValidCell);
    }
    for &cell in &cells {
        ctx.track
            .place_temporary_tile(cell, TemporaryKind::IceField, ctx.owner, Expiry::Managed);
    }
    tracing::debug!(owner = ctx.owner, cells = cells.len(), "Ice field placed");
    Ok(cells)
}

/// Remove exactly the ice this owner placed at `cells`.
pub(super) fn withdraw(cells: &[GridPos], track: &mut Track, owner: PlayerId) {
    for &cell in cells {
        track.remove_temporary_tile(cell, Some(owner), Some(TemporaryKind::IceField));
    }
}
