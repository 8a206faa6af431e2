use serde::{Deserialize, Serialize};
use vecrace_core::events::AbilityKind;
use vecrace_core::geometry::{GridPos, Vec2i};
use vecrace_core::player::{PlayerColor, PlayerId};

use crate::abilities::Ability;
use crate::config::{AbilityConfig, PhysicsConfig};
use crate::track::Track;

/// Kinematic state of a car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: GridPos,
    pub velocity: Vec2i,
    /// Visited cells, oldest first. Never holds two equal consecutive entries.
    pub path: Vec<GridPos>,
    /// Heading in radians, refreshed whenever the car has velocity.
    pub last_angle: f32,
    pub on_ice: bool,
}

impl Motion {
    pub fn at(start: GridPos) -> Self {
        Self {
            position: start,
            path: vec![start],
            ..Default::default()
        }
    }

    /// Move to `pos`, extending the path unless it would repeat the last entry.
    pub fn advance_to(&mut self, pos: GridPos) {
        self.position = pos;
        if self.path.last() != Some(&pos) {
            self.path.push(pos);
        }
    }

    /// Add a requested acceleration to the velocity, damped when on ice.
    /// Returns the delta actually applied.
    pub fn apply_velocity_delta(&mut self, requested: Vec2i, physics: &PhysicsConfig) -> Vec2i {
        let applied = if self.on_ice {
            Vec2i::new(
                ice_axis(requested.dx, self.velocity.dx, physics),
                ice_axis(requested.dy, self.velocity.dy, physics),
            )
        } else {
            requested
        };
        self.velocity += applied;
        if !self.velocity.is_zero() {
            self.last_angle = self.velocity.angle();
        }
        applied
    }

    /// Cell the car reaches next turn if it coasts.
    pub fn predicted(&self) -> GridPos {
        self.position.offset(self.velocity)
    }

    /// Delta of the most recent path segment, if the car has moved.
    pub fn last_step(&self) -> Option<Vec2i> {
        match self.path.as_slice() {
            [.., prev, last] => Some(prev.delta_to(*last)),
            _ => None,
        }
    }
}

/// Rounds half toward positive infinity.
pub(crate) fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// One axis of the ice rule. A coasting axis keeps at least unit momentum in
/// the direction it is already travelling.
fn ice_axis(requested: i32, velocity: i32, physics: &PhysicsConfig) -> i32 {
    let mut applied = round_half_up(requested as f32 * physics.ice_damping);
    if requested == 0 && velocity != 0 {
        let carry = ((velocity as f32 * physics.ice_continuation).floor() as i32)
            .abs()
            .min(1);
        applied += velocity.signum() * carry;
        if applied == 0 {
            applied = velocity.signum();
        }
    }
    applied
}

/// A racer and their loadout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub motion: Motion,
    pub crashed: bool,
    pub finished: bool,
    pub moves_made: u32,
    pub hints_remaining: u32,
    pub abilities: Vec<Ability>,
}

impl Player {
    /// Standard loadout: Insta-Stop, Rear Guard, Ice Slick.
    pub fn new(id: PlayerId, color: PlayerColor, max_hints: u32, abilities: &AbilityConfig) -> Self {
        Self {
            id,
            name: format!("Player {}", id + 1),
            color,
            motion: Motion::default(),
            crashed: false,
            finished: false,
            moves_made: 0,
            hints_remaining: max_hints,
            abilities: [
                AbilityKind::InstaStop,
                AbilityKind::RearGuard,
                AbilityKind::IceSlick,
            ]
            .into_iter()
            .map(|kind| Ability::new(kind, abilities.charges))
            .collect(),
        }
    }

    /// Put the car back on `start` for a fresh attempt. Identity and ability
    /// instances survive; active ability effects are withdrawn from `track`.
    pub fn reset(&mut self, start: GridPos, track: &mut Track, max_hints: u32) {
        let last_angle = self.motion.last_angle;
        self.motion = Motion::at(start);
        self.motion.last_angle = last_angle;
        self.crashed = false;
        self.finished = false;
        self.moves_made = 0;
        self.hints_remaining = max_hints;
        for ability in &mut self.abilities {
            if ability.is_active {
                ability.deactivate(track, self.id);
            }
            ability.reset_charges();
        }
    }

    pub fn crash(&mut self) {
        self.crashed = true;
        self.motion.velocity = Vec2i::ZERO;
        self.motion.on_ice = false;
    }

    /// Neither crashed nor finished.
    pub fn is_racing(&self) -> bool {
        !self.crashed && !self.finished
    }

    pub fn ability_index(&self, kind: AbilityKind) -> Option<usize> {
        self.abilities.iter().position(|a| a.kind == kind)
    }

    pub fn has_active(&self, kind: AbilityKind) -> bool {
        self.abilities.iter().any(|a| a.kind == kind && a.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Expiry, TemporaryKind};

    fn on_ice(velocity: Vec2i) -> Motion {
        Motion {
            velocity,
            on_ice: true,
            ..Motion::at(GridPos::new(5, 5))
        }
    }

    #[test]
    fn advance_skips_duplicate_entries() {
        let mut m = Motion::at(GridPos::new(1, 1));
        m.advance_to(GridPos::new(1, 1));
        m.advance_to(GridPos::new(2, 1));
        m.advance_to(GridPos::new(2, 1));
        assert_eq!(m.path, vec![GridPos::new(1, 1), GridPos::new(2, 1)]);
    }

    #[test]
    fn dry_track_applies_full_delta() {
        let mut m = Motion::at(GridPos::new(1, 1));
        let applied = m.apply_velocity_delta(Vec2i::new(1, -1), &PhysicsConfig::default());
        assert_eq!(applied, Vec2i::new(1, -1));
        assert_eq!(m.velocity, Vec2i::new(1, -1));
    }

    #[test]
    fn ice_swallows_unit_acceleration() {
        let mut m = on_ice(Vec2i::ZERO);
        m.apply_velocity_delta(Vec2i::new(1, -1), &PhysicsConfig::default());
        assert_eq!(m.velocity, Vec2i::ZERO);
    }

    #[test]
    fn ice_coasting_keeps_unit_momentum() {
        let mut m = on_ice(Vec2i::new(2, -4));
        let applied = m.apply_velocity_delta(Vec2i::ZERO, &PhysicsConfig::default());
        // dx: floor(0.6) = 0 carry, forced to sign; dy: |floor(-1.2)| = 2 capped to 1
        assert_eq!(applied, Vec2i::new(1, -1));
        assert_eq!(m.velocity, Vec2i::new(3, -5));
    }

    #[test]
    fn ice_braking_on_one_axis_coasts_the_other() {
        let mut m = on_ice(Vec2i::new(3, 0));
        let applied = m.apply_velocity_delta(Vec2i::new(-1, 0), &PhysicsConfig::default());
        assert_eq!(applied, Vec2i::ZERO);
    }

    #[test]
    fn last_step_needs_two_points() {
        let mut m = Motion::at(GridPos::new(1, 1));
        assert_eq!(m.last_step(), None);
        m.advance_to(GridPos::new(3, 2));
        assert_eq!(m.last_step(), Some(Vec2i::new(2, 1)));
    }

    #[test]
    fn crash_stops_car_and_clears_ice() {
        let mut p = Player::new(0, PlayerColor::default(), 3, &AbilityConfig::default());
        p.motion = on_ice(Vec2i::new(2, 2));
        p.crash();
        assert!(p.crashed);
        assert!(!p.is_racing());
        assert_eq!(p.motion.velocity, Vec2i::ZERO);
        assert!(!p.motion.on_ice);
    }

    #[test]
    fn reset_restores_charges_and_withdraws_ice() {
        let mut track = Track::new(30, 20);
        let mut p = Player::new(1, PlayerColor::default(), 3, &AbilityConfig::default());
        let ice = p.ability_index(AbilityKind::IceSlick).unwrap();
        let cell = GridPos::new(6, 6);
        track.place_temporary_tile(cell, TemporaryKind::IceField, 1, Expiry::Managed);
        {
            let a = &mut p.abilities[ice];
            a.current_charges = 0;
            a.is_active = true;
            a.placed.push(cell);
        }
        p.hints_remaining = 0;
        p.moves_made = 9;

        p.reset(GridPos::new(2, 2), &mut track, 3);

        assert_eq!(p.motion.path, vec![GridPos::new(2, 2)]);
        assert_eq!(p.hints_remaining, 3);
        assert_eq!(p.moves_made, 0);
        assert_eq!(p.abilities[ice].current_charges, 1);
        assert!(!p.abilities[ice].is_active);
        assert!(track.temporary_tiles().is_empty());
        assert_eq!(p.name, "Player 2");
    }
}
