use vecrace_core::geometry::Vec2i;

use super::AbilityContext;
use crate::error::AbilityError;
use crate::player::{Motion, round_half_up};
use crate::track::{Expiry, TemporaryKind, TileKind};

/// Unit direction pointing behind the car.
///
/// Prefers the reversed velocity, then the reversed last move, then the
/// reversed heading. Falls back to +Y (down the grid) if all of those vanish.
pub fn behind_direction(motion: &Motion) -> Vec2i {
    let back = if !motion.velocity.is_zero() {
        motion.velocity.reverse_dominant()
    } else if let Some(step) = motion.last_step() {
        step.reverse_dominant()
    } else {
        let (sin, cos) = motion.last_angle.sin_cos();
        Vec2i::new(-round_half_up(cos), -round_half_up(sin))
    };
    if back.is_zero() { Vec2i::new(0, 1) } else { back }
}

/// Drop up to `rear_wall_length` wall cells behind the car, stopping at the
/// first cell that is not Empty.
pub(super) fn activate(motion: &Motion, ctx: &mut AbilityContext<'_>) -> Result<(), AbilityError> {
    let dir = behind_direction(motion);
    let cells: Vec<_> = (1..=ctx.config.rear_wall_length)
        .map(|i| motion.position.step(dir, i))
        .take_while(|&cell| ctx.track.effective_tile(cell) == TileKind::Empty)
        .collect();
    if cells.is_empty() {
        return Err(AbilityError::NoValidCell);
    }
    let expiry = Expiry::OnTurn(ctx.turn + ctx.config.rear_wall_duration_turns + 1);
    for &cell in &cells {
        ctx.track
            .place_temporary_tile(cell, TemporaryKind::TempWall, ctx.owner, expiry);
    }
    tracing::debug!(owner = ctx.owner, segments = cells.len(), ?expiry, "Rear wall deployed");
    Ok(())
}
