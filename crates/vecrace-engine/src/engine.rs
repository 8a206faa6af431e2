use std::time::Duration;

use vecrace_core::events::{AbilityKind, CrashCause, RaceEvent, RaceMode, RankEntry};
use vecrace_core::geometry::{GridPos, Vec2i};
use vecrace_core::notice::{Notice, NoticeQueue};
use vecrace_core::player::{PlayerColor, PlayerId};
use vecrace_core::time::{Deferred, FrameClock};

use crate::abilities::AbilityContext;
use crate::collision;
use crate::config::RaceConfig;
use crate::error::{AbilityError, MapError, SetupError};
use crate::player::Player;
use crate::scoring;
use crate::snapshot::RaceSnapshot;
use crate::track::{Expiry, TemporaryKind, TileKind, Track, TrackDefinition};

/// A predicted-next-position arrow shown for a limited time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hint {
    pub player_id: PlayerId,
    pub from: GridPos,
    pub to: GridPos,
    expires_at: Duration,
}

/// Name and id of the loaded track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInfo {
    pub id: String,
    pub name: String,
    pub is_tutorial: bool,
}

impl MapInfo {
    fn generated() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default Track".to_string(),
            is_tutorial: false,
        }
    }
}

/// Turn-based race orchestrator.
///
/// Owns the track and the players, resolves movement and collisions, runs the
/// ability and targeting state machine and expires temporary tiles. Hosts
/// drive it through the input entry points and [`RaceEngine::frame`], then
/// read [`RaceEngine::drain_events`] and [`RaceEngine::snapshot`].
pub struct RaceEngine {
    config: RaceConfig,
    track: Track,
    map: MapInfo,
    players: Vec<Player>,
    current: usize,
    turn: u32,
    last_ticked_turn: u32,
    mode: RaceMode,
    complete: bool,
    /// Index of the active player's ability awaiting a target.
    targeting: Option<usize>,
    crash_reset: Deferred<Vec<PlayerId>>,
    clock: FrameClock,
    hint: Option<Hint>,
    notices: NoticeQueue,
    events: Vec<RaceEvent>,
    finish_order: Vec<PlayerId>,
    ranking: Vec<RankEntry>,
    tutorial_active: bool,
    last_acceleration: Option<Vec2i>,
    last_ability_used: Option<AbilityKind>,
}

impl Default for RaceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceEngine {
    pub fn new() -> Self {
        Self::with_config(RaceConfig::load())
    }

    /// Engine on the generated default track with the minimum seat count.
    pub fn with_config(config: RaceConfig) -> Self {
        let track = Track::new(config.track.default_width, config.track.default_height);
        let seats = config.players.min_players;
        Self::with_track(config, track, seats)
    }

    /// Engine racing `seats` players on `track`.
    pub fn with_track(config: RaceConfig, track: Track, seats: usize) -> Self {
        let mut engine = Self {
            config,
            track,
            map: MapInfo::generated(),
            players: Vec::new(),
            current: 0,
            turn: 0,
            last_ticked_turn: 0,
            mode: RaceMode::Racing,
            complete: false,
            targeting: None,
            crash_reset: Deferred::new(),
            clock: FrameClock::default(),
            hint: None,
            notices: NoticeQueue::new(),
            events: Vec::new(),
            finish_order: Vec::new(),
            ranking: Vec::new(),
            tutorial_active: false,
            last_acceleration: None,
            last_ability_used: None,
        };
        engine.setup_players(seats);
        engine
    }

    // ================================================================
    // Queries
    // ================================================================

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn map(&self) -> &MapInfo {
        &self.map
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.players.get(self.current).map(|p| p.id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current)
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn mode(&self) -> RaceMode {
        self.mode
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Ability index awaiting a target, if targeting is pending.
    pub fn targeting(&self) -> Option<usize> {
        self.targeting
    }

    pub fn is_targeting(&self) -> bool {
        self.targeting.is_some()
    }

    pub fn crash_reset_pending(&self) -> bool {
        self.crash_reset.is_pending()
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.visible()
    }

    /// Final leaderboard once the race is complete, else empty.
    pub fn ranking(&self) -> &[RankEntry] {
        &self.ranking
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn tutorial_active(&self) -> bool {
        self.tutorial_active
    }

    /// Acceleration requested by the most recent accepted move.
    pub fn last_acceleration(&self) -> Option<Vec2i> {
        self.last_acceleration
    }

    /// Ability kind most recently used successfully.
    pub fn last_ability_used(&self) -> Option<AbilityKind> {
        self.last_ability_used
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot::capture(self)
    }

    /// Take the outcome events produced since the previous drain.
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    fn accepts_input(&self) -> bool {
        self.mode == RaceMode::Racing && !self.complete && !self.players.is_empty()
    }

    fn notify(&mut self, text: impl Into<String>) {
        let duration = self.config.timing.notice_duration();
        self.notices.push(Notice::transient(text, duration));
    }

    fn notify_persistent(&mut self, text: impl Into<String>) {
        self.notices.push(Notice::persistent(text));
    }

    // ================================================================
    // Setup
    // ================================================================

    /// Replace every seat with `count` fresh players (clamped to the
    /// configured limits), then reset the race.
    pub fn setup_players(&mut self, count: usize) {
        let limits = &self.config.players;
        let count = count.clamp(limits.min_players, limits.max_players.max(limits.min_players));
        self.players = (0..count)
            .map(|id| {
                Player::new(
                    id,
                    PlayerColor::for_seat(id),
                    self.config.players.max_hints,
                    &self.config.abilities,
                )
            })
            .collect();
        tracing::debug!(players = count, "Players set up");
        let _ = self.reset_race();
    }

    pub fn add_player(&mut self) -> bool {
        if self.players.len() >= self.config.players.max_players {
            return false;
        }
        self.setup_players(self.players.len() + 1);
        true
    }

    pub fn remove_player(&mut self) -> bool {
        if self.players.len() <= self.config.players.min_players {
            return false;
        }
        self.setup_players(self.players.len() - 1);
        true
    }

    /// Start the race over on the current track.
    ///
    /// A racing-mode track without Start tiles forces edit mode and leaves a
    /// persistent notice.
    pub fn reset_race(&mut self) -> Result<(), SetupError> {
        self.complete = false;
        self.current = 0;
        self.turn = 0;
        self.last_ticked_turn = 0;
        self.hint = None;
        self.targeting = None;
        self.crash_reset.cancel();
        self.track.clear_temporary();
        self.finish_order.clear();
        self.ranking.clear();
        self.last_acceleration = None;
        self.last_ability_used = None;
        self.notices.clear();

        if self.players.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if self.track.start_positions().is_empty() && self.mode == RaceMode::Racing {
            return Err(self.force_edit_mode(SetupError::MissingStartOrFinish));
        }
        let starts = self.track.start_positions_or_fallback();
        let max_hints = self.config.players.max_hints;
        for (i, player) in self.players.iter_mut().enumerate() {
            player.reset(starts[i % starts.len()], &mut self.track, max_hints);
        }
        tracing::debug!(players = self.players.len(), map = %self.map.id, "Race reset");
        Ok(())
    }

    fn force_edit_mode(&mut self, err: SetupError) -> SetupError {
        tracing::warn!("Cannot race: {err}");
        self.notify_persistent(format!("{err}! Please add them in the editor."));
        if self.mode != RaceMode::Editing {
            self.mode = RaceMode::Editing;
            self.events.push(RaceEvent::ModeChanged {
                mode: RaceMode::Editing,
            });
        }
        err
    }

    /// Switch between editing the track and racing on it.
    pub fn switch_mode(&mut self, mode: RaceMode) -> Result<(), SetupError> {
        self.cancel_targeting();
        match mode {
            RaceMode::Editing => {
                self.hint = None;
                self.crash_reset.cancel();
                self.notices.clear();
                if self.mode != RaceMode::Editing {
                    self.mode = RaceMode::Editing;
                    self.events.push(RaceEvent::ModeChanged { mode });
                }
                Ok(())
            },
            RaceMode::Racing => {
                if !self.track.is_raceable() {
                    return Err(self.force_edit_mode(SetupError::MissingStartOrFinish));
                }
                if self.mode != RaceMode::Racing {
                    self.mode = RaceMode::Racing;
                    self.events.push(RaceEvent::ModeChanged { mode });
                }
                self.reset_race()
            },
        }
    }

    /// Re-enter the current mode after the track changed underneath us.
    fn restart(&mut self) {
        let _ = match self.mode {
            RaceMode::Racing => self.switch_mode(RaceMode::Racing),
            RaceMode::Editing => self.reset_race(),
        };
    }

    /// Replace the track with a generated default of the given size (clamped).
    pub fn set_track_size(&mut self, width: usize, height: usize) {
        let limits = &self.config.track;
        let width = width.clamp(limits.min_size, limits.max_width.max(limits.min_size));
        let height = height.clamp(limits.min_size, limits.max_height.max(limits.min_size));
        self.track = Track::new(width, height);
        self.map = MapInfo::generated();
        self.restart();
        self.notify("Track size changed. Track reset to default.");
    }

    /// Load a map definition. Malformed data leaves a cleared bordered grid
    /// (which forces edit mode when racing).
    pub fn load_map_data(&mut self, def: &TrackDefinition) -> Result<(), MapError> {
        let result = self.track.load_map_data(def);
        self.map = match &result {
            Ok(()) => MapInfo {
                id: def.id.clone(),
                name: def.name.clone(),
                is_tutorial: def.is_tutorial,
            },
            Err(_) => MapInfo {
                id: "cleared".to_string(),
                name: "Cleared Track".to_string(),
                is_tutorial: false,
            },
        };
        self.restart();
        result
    }

    /// Editor paint tool. Only permanent kinds, only in edit mode.
    pub fn paint_tile(&mut self, x: i32, y: i32, kind: TileKind) -> bool {
        let pos = GridPos::new(x, y);
        if self.mode != RaceMode::Editing || !kind.is_permanent() || !self.track.in_bounds(pos) {
            return false;
        }
        if self.track.effective_tile(pos) == kind {
            return false;
        }
        self.track.set_permanent_tile(pos, kind);
        true
    }

    /// Editor eraser: drops any overlay and empties the cell.
    pub fn erase_tile(&mut self, x: i32, y: i32) -> bool {
        let pos = GridPos::new(x, y);
        if self.mode != RaceMode::Editing || !self.track.in_bounds(pos) {
            return false;
        }
        self.track.remove_temporary_tile(pos, None, None);
        self.track.set_permanent_tile(pos, TileKind::Empty);
        true
    }

    pub fn reset_track_to_default(&mut self) {
        if self.mode != RaceMode::Editing {
            return;
        }
        self.track.reset_to_default();
        self.notify("Track reset to default.");
    }

    pub fn clear_track(&mut self) {
        if self.mode != RaceMode::Editing {
            return;
        }
        self.track.clear();
        self.notify("Track cleared (borders remain).");
    }

    /// Tell the engine a tutorial is driving it. While set, a crashed or
    /// finished active player does not auto-pass.
    pub fn set_tutorial_active(&mut self, active: bool) {
        self.tutorial_active = active;
    }

    /// Put a player back on an arbitrary cell as if they had just started.
    pub fn place_player(&mut self, id: PlayerId, pos: GridPos) {
        let max_hints = self.config.players.max_hints;
        if let Some(player) = self.players.get_mut(id) {
            player.reset(pos, &mut self.track, max_hints);
        }
    }

    // ================================================================
    // Movement
    // ================================================================

    /// Accelerate the active car by `delta` (each axis clamped to -1..=1) and
    /// resolve the resulting move.
    pub fn attempt_move(&mut self, delta: Vec2i) {
        if !self.accepts_input() || self.crash_reset.is_pending() || self.targeting.is_some() {
            return;
        }
        let idx = self.current;
        if !self.players[idx].is_racing() {
            if !self.tutorial_active {
                self.advance_turn();
            }
            return;
        }
        let delta = delta.signum();
        self.last_acceleration = Some(delta);

        let player = &mut self.players[idx];
        player
            .motion
            .apply_velocity_delta(delta, &self.config.physics);
        let id = player.id;
        let from = player.motion.position;
        let to = player.motion.predicted();

        if let Some(site) = collision::trace_wall_collision(&self.track, from, to) {
            self.crash_into_wall(id, site);
        } else if let Some(other) = collision::find_player_collision(&self.players, id, to) {
            self.crash_players(id, to, other);
        } else {
            self.commit_move(id, from, to, delta);
        }
    }

    fn crash_into_wall(&mut self, id: PlayerId, site: GridPos) {
        let player = &mut self.players[id];
        player.crash();
        let name = player.name.clone();
        tracing::info!(player_id = id, x = site.x, y = site.y, "Crashed into a wall");
        self.events.push(RaceEvent::Crashed {
            player_id: id,
            site,
            cause: CrashCause::Wall,
        });
        self.events.push(RaceEvent::Explosion {
            player_id: id,
            at: site,
        });
        self.notify(format!("{name} crashed into a wall!"));
        self.schedule_crash_reset(vec![id]);
    }

    fn crash_players(&mut self, id: PlayerId, site: GridPos, other: PlayerId) {
        self.players[id].crash();
        self.players[other].crash();
        let other_site = self.players[other].motion.position;
        tracing::info!(player_id = id, other, x = site.x, y = site.y, "Players collided");
        self.events.extend([
            RaceEvent::Crashed {
                player_id: id,
                site,
                cause: CrashCause::Player { other },
            },
            RaceEvent::Explosion {
                player_id: id,
                at: site,
            },
            RaceEvent::Crashed {
                player_id: other,
                site: other_site,
                cause: CrashCause::Player { other: id },
            },
            RaceEvent::Explosion {
                player_id: other,
                at: other_site,
            },
        ]);
        let text = format!(
            "{} and {} collided!",
            self.players[id].name, self.players[other].name
        );
        self.notify(text);
        self.schedule_crash_reset(vec![id, other]);
    }

    fn schedule_crash_reset(&mut self, ids: Vec<PlayerId>) {
        let delay = self.config.timing.crash_reset_delay();
        self.crash_reset.schedule(self.clock.now(), delay, ids);
    }

    fn finish_crash_reset(&mut self, ids: Vec<PlayerId>) {
        let starts = self.track.start_positions_or_fallback();
        let max_hints = self.config.players.max_hints;
        for &id in &ids {
            if let Some(player) = self.players.get_mut(id) {
                player.reset(starts[id % starts.len()], &mut self.track, max_hints);
            }
        }
        tracing::debug!(?ids, "Crashed players reset");
        self.events.push(RaceEvent::CrashReset { player_ids: ids });
        self.advance_turn();
    }

    fn commit_move(&mut self, id: PlayerId, from: GridPos, to: GridPos, input: Vec2i) {
        let tile = self.track.effective_tile(to);
        let player = &mut self.players[id];
        player.motion.advance_to(to);
        player.moves_made += 1;
        player.motion.on_ice = tile == TileKind::IceField;
        self.events.push(RaceEvent::Moved {
            player_id: id,
            from,
            to,
            input,
        });

        if tile == TileKind::Finish {
            let player = &mut self.players[id];
            player.finished = true;
            let (name, moves) = (player.name.clone(), player.moves_made);
            self.finish_order.push(id);
            tracing::info!(player_id = id, moves, "Finished");
            self.events.push(RaceEvent::Finished {
                player_id: id,
                moves,
            });
            self.events.push(RaceEvent::Explosion {
                player_id: id,
                at: to,
            });
            self.notify(format!("{name} finished in {moves} moves!"));
            self.check_completion();
        }
        self.advance_turn();
    }

    /// Move the turn to the next player who has not finished, clearing the
    /// crash flag of whoever becomes active. Completes the race when nobody
    /// is left to move.
    pub fn advance_turn(&mut self) {
        if self.mode == RaceMode::Editing || self.complete || self.players.is_empty() {
            return;
        }
        self.cancel_targeting();
        self.turn += 1;

        let count = self.players.len();
        let mut found = false;
        for _ in 0..count {
            self.current = (self.current + 1) % count;
            let player = &mut self.players[self.current];
            player.crashed = false;
            if !player.finished {
                found = true;
                break;
            }
        }
        if found {
            tracing::debug!(player_id = self.current, turn = self.turn, "Turn advanced");
            self.events.push(RaceEvent::TurnAdvanced {
                player_id: self.current,
                turn: self.turn,
            });
        } else {
            self.check_completion();
        }
    }

    fn check_completion(&mut self) {
        if self.complete || self.players.is_empty() || !self.players.iter().all(|p| p.finished) {
            return;
        }
        self.complete = true;
        self.targeting = None;
        self.hint = None;
        self.ranking = scoring::ranking(&self.players, &self.finish_order);
        tracing::info!(turn = self.turn, "Race complete");

        let board = if self.ranking.is_empty() {
            "No players finished.".to_string()
        } else {
            self.ranking
                .iter()
                .map(|r| format!("{}. {} ({} moves)", r.rank, self.players[r.player_id].name, r.moves))
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.notify_persistent(format!("Race Over! {board}"));
        self.events.push(RaceEvent::RaceComplete {
            ranking: self.ranking.clone(),
        });
    }

    // ================================================================
    // Abilities and targeting
    // ================================================================

    /// Use the active player's ability at `index`. Targeting abilities enter
    /// the targeting-pending state instead of taking effect.
    pub fn activate_ability(&mut self, index: usize) -> Result<(), AbilityError> {
        if !self.accepts_input() || self.targeting.is_some() || self.crash_reset.is_pending() {
            return Err(AbilityError::Unavailable);
        }
        let player = &self.players[self.current];
        let Some(ability) = player.abilities.get(index) else {
            return Err(AbilityError::Unavailable);
        };
        if !ability.can_activate(player.is_racing(), self.targeting.is_some()) {
            return Err(AbilityError::Unavailable);
        }
        if ability.requires_targeting() {
            let (id, kind, name) = (player.id, ability.kind, ability.name());
            self.targeting = Some(index);
            tracing::info!(player_id = id, ?kind, "Targeting started");
            self.events.push(RaceEvent::TargetingStarted {
                player_id: id,
                ability: kind,
            });
            self.notify(format!("Select a target for {name}"));
            return Ok(());
        }
        self.run_ability(index, None)
    }

    /// Resolve a pending target given in cell units. Targeting ends whether
    /// or not the ability takes effect.
    pub fn submit_target(&mut self, x: f32, y: f32) -> Result<(), AbilityError> {
        let Some(index) = self.targeting.take() else {
            return Err(AbilityError::Unavailable);
        };
        let target = GridPos::from_cell_coords(x, y);
        let player = &self.players[self.current];
        let ability = &player.abilities[index];
        if let Some(max) = ability.target_range(&self.config.abilities) {
            let distance = player.motion.position.distance_to(target);
            if distance > max {
                let (id, kind, name) = (player.id, ability.kind, ability.name());
                let err = AbilityError::OutOfRange { distance, max };
                tracing::info!(player_id = id, ?kind, distance, "Target out of range");
                self.events.push(RaceEvent::AbilityFailed {
                    player_id: id,
                    ability: kind,
                    reason: err.to_string(),
                });
                self.notify(format!(
                    "Target out of range for {name}. Click ability to try again."
                ));
                return Err(err);
            }
        }
        self.run_ability(index, Some(target))
    }

    /// Leave targeting-pending without effect. No-op otherwise.
    pub fn cancel_targeting(&mut self) {
        if self.targeting.take().is_none() {
            return;
        }
        let player_id = self.current;
        tracing::info!(player_id, "Targeting cancelled");
        self.events.push(RaceEvent::TargetingCancelled { player_id });
    }

    fn run_ability(&mut self, index: usize, target: Option<GridPos>) -> Result<(), AbilityError> {
        let player_count = self.players.len();
        let player = &mut self.players[self.current];
        let owner = player.id;
        let ability = &mut player.abilities[index];
        let mut ctx = AbilityContext {
            track: &mut self.track,
            owner,
            turn: self.turn,
            player_count,
            config: &self.config.abilities,
        };
        let kind = ability.kind;
        let ability_name = ability.name();
        let result = ability.activate(&mut player.motion, &mut ctx, target);
        let player_name = player.name.clone();
        match &result {
            Ok(()) => {
                ability.consume_charge();
                self.last_ability_used = Some(kind);
                tracing::info!(player_id = owner, ?kind, "Ability used");
                self.events.push(RaceEvent::AbilityUsed {
                    player_id: owner,
                    ability: kind,
                });
                self.notify(format!("{player_name} used {ability_name}!"));
            },
            Err(e) => {
                tracing::info!(player_id = owner, ?kind, error = %e, "Ability failed");
                self.events.push(RaceEvent::AbilityFailed {
                    player_id: owner,
                    ability: kind,
                    reason: e.to_string(),
                });
                self.notify(format!("Cannot use {ability_name}: {e}"));
            },
        }
        result
    }

    // ================================================================
    // Hints
    // ================================================================

    /// Spend one hint to show where the active car lands if it coasts.
    pub fn request_hint(&mut self) -> bool {
        if !self.accepts_input() || self.hint.is_some() {
            return false;
        }
        let expires_at = self.clock.now() + self.config.timing.hint_duration();
        let player = &mut self.players[self.current];
        if !player.is_racing() || player.hints_remaining == 0 {
            return false;
        }
        player.hints_remaining -= 1;
        let hint = Hint {
            player_id: player.id,
            from: player.motion.position,
            to: player.motion.predicted(),
            expires_at,
        };
        self.events.push(RaceEvent::HintShown {
            player_id: hint.player_id,
            predicted: hint.to,
        });
        self.hint = Some(hint);
        true
    }

    // ================================================================
    // Frame loop
    // ================================================================

    /// Per-frame entry point: advance real time, fire a due crash reset,
    /// expire the hint and notices, then tick temporary effects.
    pub fn frame(&mut self, dt: Duration) {
        self.clock.advance(dt);
        let now = self.clock.now();
        if let Some(ids) = self.crash_reset.take_due(now) {
            self.finish_crash_reset(ids);
        }
        if let Some(hint) = &self.hint
            && hint.expires_at <= now
        {
            self.hint = None;
        }
        self.notices.tick(dt);
        self.tick_temporary_effects();
    }

    /// Count active ability effects down by the turns completed since the
    /// previous call, then sweep expired rear walls and orphaned ice.
    pub fn tick_temporary_effects(&mut self) {
        let elapsed = self.turn.saturating_sub(self.last_ticked_turn);
        self.last_ticked_turn = self.turn;
        for _ in 0..elapsed {
            for player in &mut self.players {
                let owner = player.id;
                for ability in player.abilities.iter_mut().filter(|a| a.is_active) {
                    if ability.tick(&mut self.track, owner) {
                        tracing::debug!(player_id = owner, kind = ?ability.kind, "Ability effect expired");
                    }
                }
            }
        }

        let turn = self.turn;
        let icing: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.has_active(AbilityKind::IceSlick))
            .map(|p| p.id)
            .collect();
        let removed = self.track.retain_temporary(|t| match (t.kind, t.expiry) {
            (TemporaryKind::TempWall, Expiry::OnTurn(at)) => turn < at,
            (TemporaryKind::TempWall, Expiry::Managed) => true,
            (TemporaryKind::IceField, _) => icing.contains(&t.owner),
        });
        if removed > 0 {
            tracing::debug!(removed, turn, "Temporary tiles expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn new_engine_is_racing_on_default_track() {
        let engine = RaceEngine::with_config(RaceConfig::default());
        assert_eq!(engine.mode(), RaceMode::Racing);
        assert_eq!(engine.players().len(), 1);
        assert_eq!(engine.current_player_id(), Some(0));
        assert_eq!(engine.players()[0].motion.position, GridPos::new(2, 2));
    }

    #[test]
    fn seats_share_starts_round_robin() {
        let engine = engine_on(&["#######", "#S...F#", "#######"], 3);
        let positions: Vec<_> = engine.players().iter().map(|p| p.motion.position).collect();
        assert_eq!(positions, vec![GridPos::new(1, 1); 3]);
    }

    #[test]
    fn player_count_is_clamped() {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        engine.setup_players(9);
        assert_eq!(engine.players().len(), 5);
        assert!(!engine.add_player());
        engine.setup_players(0);
        assert_eq!(engine.players().len(), 1);
        assert!(!engine.remove_player());
        assert!(engine.add_player());
        assert_eq!(engine.players().len(), 2);
        assert_eq!(engine.players()[1].color, PlayerColor::PALETTE[1]);
    }

    #[test]
    fn move_commits_and_advances_turn() {
        let mut engine = engine_on(OPEN_ROWS, 2);
        engine.attempt_move(Vec2i::new(1, 0));
        let p0 = &engine.players()[0];
        assert_eq!(p0.motion.position, GridPos::new(2, 1));
        assert_eq!(p0.moves_made, 1);
        assert_eq!(engine.current_player_id(), Some(1));
        assert_eq!(engine.turn(), 1);
        let events = engine.drain_events();
        assert!(matches!(events[0], RaceEvent::Moved { player_id: 0, .. }));
        assert!(matches!(
            events[1],
            RaceEvent::TurnAdvanced {
                player_id: 1,
                turn: 1
            }
        ));
    }

    #[test]
    fn coasting_in_place_keeps_path_short() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        engine.attempt_move(Vec2i::ZERO);
        let p = &engine.players()[0];
        assert_eq!(p.motion.path.len(), 1);
        assert_eq!(p.moves_made, 1);
    }

    #[test]
    fn wall_crash_resets_after_delay() {
        let mut engine = engine_on(&["#####", "#S.F#", "#####"], 1);
        engine.attempt_move(Vec2i::new(0, -1));
        assert!(engine.players()[0].crashed);
        assert!(engine.crash_reset_pending());
        assert_eq!(engine.turn(), 0);

        // Input is locked while the reset is pending.
        engine.attempt_move(Vec2i::new(1, 0));
        assert_eq!(engine.turn(), 0);

        run_frames(&mut engine, 60);
        assert!(engine.crash_reset_pending());
        run_frames(&mut engine, 40);
        assert!(!engine.crash_reset_pending());
        assert!(!engine.players()[0].crashed);
        assert_eq!(engine.players()[0].motion.position, GridPos::new(1, 1));
        assert_eq!(engine.turn(), 1);
    }

    #[test]
    fn reset_cancels_pending_crash_reset() {
        let mut engine = engine_on(&["#####", "#S.F#", "#####"], 1);
        engine.attempt_move(Vec2i::new(0, 1));
        assert!(engine.crash_reset_pending());
        engine.reset_race().unwrap();
        assert!(!engine.crash_reset_pending());
        run_frames(&mut engine, 200);
        assert_eq!(engine.turn(), 0);
    }

    #[test]
    fn ice_tile_sets_on_ice() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        engine
            .track
            .place_temporary_tile(GridPos::new(2, 1), TemporaryKind::IceField, 0, Expiry::Managed);
        engine.attempt_move(Vec2i::new(1, 0));
        assert!(engine.players()[0].motion.on_ice);
    }

    #[test]
    fn insta_stop_consumes_charge_and_keeps_turn() {
        let mut engine = engine_on(OPEN_ROWS, 2);
        engine.player_mut(0).unwrap().motion.velocity = Vec2i::new(2, 0);
        engine.activate_ability(0).unwrap();
        let p0 = &engine.players()[0];
        assert_eq!(p0.motion.velocity, Vec2i::ZERO);
        assert_eq!(p0.abilities[0].current_charges, 0);
        assert_eq!(engine.current_player_id(), Some(0));
        assert_eq!(engine.last_ability_used(), Some(AbilityKind::InstaStop));
        assert_eq!(engine.activate_ability(0), Err(AbilityError::Unavailable));
    }

    #[test]
    fn failed_rear_guard_keeps_charge() {
        // Car at (1,1) facing +X: the cell behind is the border wall.
        let mut engine = engine_on(OPEN_ROWS, 1);
        let err = engine.activate_ability(1).unwrap_err();
        assert_eq!(err, AbilityError::NoValidCell);
        assert_eq!(engine.players()[0].abilities[1].current_charges, 1);
        assert!(
            engine
                .drain_events()
                .iter()
                .any(|e| matches!(e, RaceEvent::AbilityFailed { .. }))
        );
    }

    #[test]
    fn targeting_blocks_moves_and_other_abilities() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        engine.activate_ability(2).unwrap();
        assert!(engine.is_targeting());
        engine.attempt_move(Vec2i::new(1, 0));
        assert_eq!(engine.players()[0].moves_made, 0);
        assert_eq!(engine.activate_ability(0), Err(AbilityError::Unavailable));
        engine.cancel_targeting();
        assert!(!engine.is_targeting());
        assert_eq!(engine.players()[0].abilities[2].current_charges, 1);
    }

    #[test]
    fn out_of_range_target_clears_targeting_without_charge() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine.activate_ability(2).unwrap();
        let err = engine.submit_target(12.5, 1.5).unwrap_err();
        assert!(matches!(err, AbilityError::OutOfRange { .. }));
        assert!(!engine.is_targeting());
        assert_eq!(engine.players()[0].abilities[2].current_charges, 1);
        assert!(engine.track().temporary_tiles().is_empty());
    }

    #[test]
    fn in_range_target_places_ice_and_consumes_charge() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine.activate_ability(2).unwrap();
        engine.submit_target(4.2, 2.9).unwrap();
        assert!(!engine.is_targeting());
        let ice = &engine.players()[0].abilities[2];
        assert_eq!(ice.current_charges, 0);
        assert!(ice.is_active);
        assert_eq!(
            engine.track().effective_tile(GridPos::new(4, 2)),
            TileKind::IceField
        );
    }

    #[test]
    fn submit_without_targeting_is_rejected() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        assert_eq!(engine.submit_target(2.0, 2.0), Err(AbilityError::Unavailable));
    }

    #[test]
    fn ice_expires_after_scaled_turns() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine.activate_ability(2).unwrap();
        engine.submit_target(5.0, 2.0).unwrap();
        // 3 rounds x 1 player + 1 = 4 turns.
        for _ in 0..3 {
            engine.advance_turn();
            engine.frame(FRAME);
            assert!(!engine.track().temporary_tiles().is_empty());
        }
        // Extra frames within the same turn do not count down.
        run_frames(&mut engine, 30);
        assert!(!engine.track().temporary_tiles().is_empty());
        engine.advance_turn();
        engine.frame(FRAME);
        assert!(engine.track().temporary_tiles().is_empty());
        assert!(!engine.players()[0].abilities[2].is_active);
    }

    #[test]
    fn rear_wall_expires_on_its_turn() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine.place_player(0, GridPos::new(5, 2));
        engine.activate_ability(1).unwrap();
        assert_eq!(engine.track().temporary_tiles().len(), 2);
        for _ in 0..5 {
            engine.advance_turn();
            engine.frame(FRAME);
        }
        assert_eq!(engine.turn(), 5);
        assert_eq!(engine.track().temporary_tiles().len(), 2);
        engine.advance_turn();
        engine.frame(FRAME);
        assert!(engine.track().temporary_tiles().is_empty());
    }

    #[test]
    fn orphaned_ice_is_swept() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine
            .track
            .place_temporary_tile(GridPos::new(3, 2), TemporaryKind::IceField, 0, Expiry::Managed);
        engine.tick_temporary_effects();
        assert!(engine.track().temporary_tiles().is_empty());
    }

    #[test]
    fn hint_predicts_coast_and_expires() {
        let mut engine = engine_on(WIDE_ROWS, 1);
        engine.attempt_move(Vec2i::new(1, 0));
        assert!(engine.request_hint());
        assert!(!engine.request_hint());
        let hint = *engine.hint().unwrap();
        assert_eq!(hint.to, GridPos::new(3, 1));
        assert_eq!(engine.players()[0].hints_remaining, 2);
        run_frames(&mut engine, 121);
        assert!(engine.hint().is_none());
    }

    #[test]
    fn editing_blocks_input_and_paint_requires_it() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        assert!(!engine.paint_tile(2, 1, TileKind::Wall));
        engine.switch_mode(RaceMode::Editing).unwrap();
        engine.attempt_move(Vec2i::new(1, 0));
        assert_eq!(engine.players()[0].moves_made, 0);
        assert!(engine.paint_tile(2, 1, TileKind::Wall));
        assert!(!engine.paint_tile(2, 1, TileKind::Wall));
        assert!(!engine.paint_tile(2, 1, TileKind::IceField));
        assert!(engine.erase_tile(2, 1));
        assert_eq!(
            engine.track().permanent_tile(GridPos::new(2, 1)),
            TileKind::Empty
        );
    }

    #[test]
    fn racing_on_invalid_track_forces_edit_mode() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        engine.switch_mode(RaceMode::Editing).unwrap();
        engine.clear_track();
        assert_eq!(
            engine.switch_mode(RaceMode::Racing),
            Err(SetupError::MissingStartOrFinish)
        );
        assert_eq!(engine.mode(), RaceMode::Editing);
        assert!(!engine.notices().is_empty());
    }

    #[test]
    fn malformed_map_forces_edit_mode() {
        let mut engine = engine_on(OPEN_ROWS, 1);
        let def = TrackDefinition {
            id: "bad".into(),
            name: "Bad".into(),
            width: 10,
            height: 10,
            grid: None,
            is_tutorial: false,
        };
        assert!(engine.load_map_data(&def).is_err());
        assert_eq!(engine.mode(), RaceMode::Editing);
        assert_eq!(engine.map().id, "cleared");
    }

    #[test]
    fn track_size_is_clamped() {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        engine.set_track_size(500, 3);
        assert_eq!(engine.track().width(), 100);
        assert_eq!(engine.track().height(), 10);
        // A 10-high default track has no start, so the engine drops to editing.
        assert_eq!(engine.mode(), RaceMode::Editing);
        engine.set_track_size(40, 25);
        assert_eq!(engine.mode(), RaceMode::Editing);
        assert!(engine.switch_mode(RaceMode::Racing).is_ok());
    }

    #[test]
    fn crashed_active_player_passes_unless_tutorial() {
        let mut engine = engine_on(OPEN_ROWS, 2);
        engine.player_mut(0).unwrap().crashed = true;
        engine.set_tutorial_active(true);
        engine.attempt_move(Vec2i::new(1, 0));
        assert_eq!(engine.turn(), 0);
        engine.set_tutorial_active(false);
        engine.attempt_move(Vec2i::new(1, 0));
        assert_eq!(engine.turn(), 1);
        assert_eq!(engine.current_player_id(), Some(1));
        assert_eq!(engine.players()[0].moves_made, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn random_driving_never_parks_on_a_wall(
                inputs in prop::collection::vec((-1i32..=1, -1i32..=1), 1..30),
            ) {
                let mut engine = engine_on(WIDE_ROWS, 2);
                for (dx, dy) in inputs {
                    engine.attempt_move(Vec2i::new(dx, dy));
                    run_frames(&mut engine, 80);
                    prop_assert!(!engine.crash_reset_pending());
                    for p in engine.players() {
                        let tile = engine.track().effective_tile(p.motion.position);
                        prop_assert!(!tile.is_solid());
                        prop_assert!(p.motion.path.windows(2).all(|w| w[0] != w[1]));
                        prop_assert!(p.hints_remaining <= 3);
                    }
                }
            }

            #[test]
            fn turn_only_moves_forward(seats in 1usize..=5, passes in 0usize..12) {
                let mut engine = engine_on(WIDE_ROWS, seats);
                let mut last = engine.turn();
                for _ in 0..passes {
                    engine.advance_turn();
                    prop_assert!(engine.turn() == last + 1);
                    prop_assert!(engine.current_player_id().is_some_and(|id| id < seats));
                    last = engine.turn();
                }
            }
        }
    }
}
