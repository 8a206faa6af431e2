use vecrace_core::geometry::Vec2i;

use crate::error::AbilityError;
use crate::player::Motion;

/// Kill all velocity. Always succeeds.
pub(super) fn activate(motion: &mut Motion) -> Result<(), AbilityError> {
    motion.velocity = Vec2i::ZERO;
    Ok(())
}
