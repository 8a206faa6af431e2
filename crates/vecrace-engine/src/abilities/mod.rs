mod ice_slick;
mod insta_stop;
mod rear_guard;

use serde::{Deserialize, Serialize};
use vecrace_core::effect::TurnCountdown;
use vecrace_core::events::AbilityKind;
use vecrace_core::geometry::GridPos;
use vecrace_core::player::PlayerId;

use crate::config::AbilityConfig;
use crate::error::AbilityError;
use crate::player::Motion;
use crate::track::Track;

pub use rear_guard::behind_direction;

/// Engine state an ability may read or mutate while taking effect.
pub struct AbilityContext<'a> {
    pub track: &'a mut Track,
    pub owner: PlayerId,
    pub turn: u32,
    /// Seats in the race, used to scale per-round durations.
    pub player_count: usize,
    pub config: &'a AbilityConfig,
}

/// One charge-gated ability instance owned by a player.
///
/// The three variants share this record; per-variant behaviour lives in the
/// `insta_stop`, `rear_guard` and `ice_slick` modules and is dispatched on
/// `kind`. Charges are only consumed by the engine after a successful
/// [`Ability::activate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub kind: AbilityKind,
    pub max_charges: u32,
    pub current_charges: u32,
    /// True while a timed effect is in progress.
    pub is_active: bool,
    pub countdown: TurnCountdown,
    /// Cells placed by the current activation, for cleanup.
    pub placed: Vec<GridPos>,
}

impl Ability {
    pub fn new(kind: AbilityKind, charges: u32) -> Self {
        Self {
            kind,
            max_charges: charges,
            current_charges: charges,
            is_active: false,
            countdown: TurnCountdown::default(),
            placed: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            AbilityKind::InstaStop => "Insta-Stop",
            AbilityKind::RearGuard => "Rear Guard",
            AbilityKind::IceSlick => "Ice Slick",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.kind {
            AbilityKind::InstaStop => "🛑",
            AbilityKind::RearGuard => "🧱",
            AbilityKind::IceSlick => "🧊",
        }
    }

    pub fn description(&self, config: &AbilityConfig) -> String {
        match self.kind {
            AbilityKind::InstaStop => "Immediately halts all movement.".to_string(),
            AbilityKind::RearGuard => format!(
                "Deploys a temporary wall behind you for {} game turns.",
                config.rear_wall_duration_turns
            ),
            AbilityKind::IceSlick => {
                let side = config.ice_size_radius * 2 + 1;
                format!(
                    "Creates a {side}x{side} ice field within {} squares. Lasts a few rounds.",
                    config.ice_place_radius
                )
            },
        }
    }

    /// Only the area effect needs a map target before it can take effect.
    pub fn requires_targeting(&self) -> bool {
        self.kind == AbilityKind::IceSlick
    }

    /// Max Euclidean distance from the car to a valid target, if constrained.
    pub fn target_range(&self, config: &AbilityConfig) -> Option<f32> {
        self.requires_targeting().then_some(config.ice_place_radius)
    }

    /// Charges left, not mid-effect, the driver is still racing, and no other
    /// ability is waiting on a target.
    pub fn can_activate(&self, driver_racing: bool, targeting_pending: bool) -> bool {
        self.current_charges > 0 && !self.is_active && driver_racing && !targeting_pending
    }

    /// Apply the effect. Never touches charges.
    pub fn activate(
        &mut self,
        motion: &mut Motion,
        ctx: &mut AbilityContext<'_>,
        target: Option<GridPos>,
    ) -> Result<(), AbilityError> {
        match self.kind {
            AbilityKind::InstaStop => insta_stop::activate(motion),
            AbilityKind::RearGuard => rear_guard::activate(motion, ctx),
            AbilityKind::IceSlick => {
                let target = target.ok_or(AbilityError::MissingTarget)?;
                let placed = ice_slick::activate(target, ctx)?;
                let turns = ctx.config.ice_base_rounds * ctx.player_count as u32 + 1;
                self.is_active = true;
                self.countdown = TurnCountdown::new(turns);
                self.placed = placed;
                Ok(())
            },
        }
    }

    /// Count one turn off an active timed effect, deactivating at zero.
    /// Returns true if this tick ended the effect.
    pub fn tick(&mut self, track: &mut Track, owner: PlayerId) -> bool {
        if !self.is_active || self.countdown.total == 0 {
            return false;
        }
        if self.countdown.tick() {
            self.deactivate(track, owner);
            return true;
        }
        false
    }

    /// Withdraw the effect from the track and go idle.
    pub fn deactivate(&mut self, track: &mut Track, owner: PlayerId) {
        if self.kind == AbilityKind::IceSlick {
            ice_slick::withdraw(&self.placed, track, owner);
        }
        self.placed.clear();
        self.is_active = false;
        self.countdown.clear();
    }

    pub fn reset_charges(&mut self) {
        self.current_charges = self.max_charges;
        self.is_active = false;
        self.countdown.clear();
        self.placed.clear();
    }

    pub fn consume_charge(&mut self) {
        self.current_charges = self.current_charges.saturating_sub(1);
    }
}
