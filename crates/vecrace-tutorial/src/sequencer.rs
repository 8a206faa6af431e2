use vecrace_core::events::{ActionKind, RaceEvent, RaceMode};
use vecrace_core::geometry::GridPos;
use vecrace_engine::RaceEngine;
use vecrace_engine::command::RaceCommand;
use vecrace_engine::error::{MapError, SetupError};
use vecrace_engine::maps::{self, DEFAULT_MAP_ID, TUTORIAL_MAP_ID};

use crate::controls::{Control, ControlAccess, Highlight};
use crate::steps::{self, Step};

/// Why the tutorial could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorialError {
    MapMissing,
    Map(MapError),
    Setup(SetupError),
}

impl std::fmt::Display for TutorialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapMissing => write!(f, "tutorial map data is missing"),
            Self::Map(e) => write!(f, "tutorial map failed to load: {e}"),
            Self::Setup(e) => write!(f, "tutorial race could not start: {e}"),
        }
    }
}

impl std::error::Error for TutorialError {}

impl From<MapError> for TutorialError {
    fn from(e: MapError) -> Self {
        Self::Map(e)
    }
}

impl From<SetupError> for TutorialError {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

/// Linear step machine layered over a [`RaceEngine`].
///
/// While active it gates host input through each step's control allow-list,
/// classifies the engine's outcome events and advances when the step's
/// predicate holds.
#[derive(Debug)]
pub struct Tutorial {
    steps: Vec<Step>,
    index: usize,
    active: bool,
    last_action: Option<ActionKind>,
    access: ControlAccess,
    highlight: Option<Highlight>,
}

impl Default for Tutorial {
    fn default() -> Self {
        Self::new()
    }
}

impl Tutorial {
    pub fn new() -> Self {
        Self::with_steps(steps::default_steps())
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            index: 0,
            active: false,
            last_action: None,
            access: ControlAccess::All,
            highlight: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn step_index(&self) -> usize {
        self.index
    }

    pub fn current_step(&self) -> Option<&Step> {
        if !self.active {
            return None;
        }
        self.steps.get(self.index)
    }

    pub fn access(&self) -> &ControlAccess {
        &self.access
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    pub fn last_action(&self) -> Option<ActionKind> {
        self.last_action
    }

    pub fn allows(&self, control: Option<Control>) -> bool {
        self.access.allows(control)
    }

    /// Load the tutorial map, seat a single player at the configured tutorial
    /// coordinate and enter the first step.
    pub fn start(&mut self, engine: &mut RaceEngine) -> Result<(), TutorialError> {
        let def = maps::find_map(TUTORIAL_MAP_ID).ok_or(TutorialError::MapMissing)?;
        if engine.map().id != TUTORIAL_MAP_ID {
            engine.load_map_data(&def)?;
        }
        if engine.mode() != RaceMode::Racing {
            engine.switch_mode(RaceMode::Racing)?;
        }
        engine.setup_players(1);
        engine.set_tutorial_active(true);
        let cfg = &engine.config().tutorial;
        let start = GridPos::new(cfg.start_x, cfg.start_y);
        engine.place_player(0, start);

        self.active = true;
        self.index = 0;
        self.last_action = None;
        tracing::info!(x = start.x, y = start.y, "Tutorial started");
        self.enter_step(engine);
        Ok(())
    }

    /// Record the latest classified action for the next predicate check.
    pub fn notify_action(&mut self, action: ActionKind) {
        if self.active {
            self.last_action = Some(action);
        }
    }

    /// Evaluate the current step. On success runs its cleanup, clears the
    /// highlight and enters the next step, or ends the tutorial after the
    /// last one. Returns whether the step completed.
    pub fn check_completion(&mut self, engine: &mut RaceEngine, action: Option<ActionKind>) -> bool {
        if !self.active {
            return false;
        }
        let Some(step) = self.steps.get(self.index) else {
            return false;
        };
        let action = action.or(self.last_action);
        self.last_action = None;
        let done = engine
            .player(0)
            .is_some_and(|player| (step.is_complete)(player, engine, action));
        if !done {
            return false;
        }

        let (id, cleanup) = (step.id, step.cleanup);
        tracing::info!(step = id, "Tutorial step completed");
        if let Some(hook) = cleanup {
            hook(engine);
        }
        self.highlight = None;
        self.index += 1;
        if self.index >= self.steps.len() {
            self.end(engine);
        } else {
            self.enter_step(engine);
        }
        true
    }

    /// Host pressed the Next button.
    pub fn press_next(&mut self, engine: &mut RaceEngine) -> bool {
        if !self.active || !self.allows(Some(Control::TutorialNext)) {
            return false;
        }
        self.notify_action(ActionKind::NextClicked);
        self.check_completion(engine, Some(ActionKind::NextClicked))
    }

    /// Leave the tutorial: lift every restriction and return to a normal
    /// race on the default map.
    pub fn end(&mut self, engine: &mut RaceEngine) {
        if !self.release(engine) {
            return;
        }
        if engine.map().id == TUTORIAL_MAP_ID {
            match maps::find_map(DEFAULT_MAP_ID) {
                Some(def) => {
                    if let Err(e) = engine.load_map_data(&def) {
                        tracing::warn!(error = %e, "Default map failed to load after tutorial");
                    }
                },
                None => tracing::warn!(map = DEFAULT_MAP_ID, "Default map missing"),
            }
        } else if let Err(e) = engine.reset_race() {
            tracing::warn!(error = %e, "Race reset after tutorial failed");
        }
    }

    /// Gate `command` through the active step's allow-list, apply it and run
    /// the completion check on the outcome.
    ///
    /// Returns `None` when the command was blocked, otherwise the events the
    /// engine produced since they were last drained.
    pub fn dispatch(&mut self, engine: &mut RaceEngine, command: &RaceCommand) -> Option<Vec<RaceEvent>> {
        self.end_if_editing(engine);
        if self.active {
            let control = Control::for_command(command, engine);
            if !self.allows(control) {
                tracing::debug!(?command, "Control disabled by tutorial");
                return None;
            }
        }
        if let RaceCommand::SwitchMode { mode } = command {
            if let Err(e) = self.switch_mode(engine, *mode) {
                tracing::debug!(error = %e, "Mode switch rejected");
            }
            self.end_if_editing(engine);
            return Some(engine.drain_events());
        }

        command.apply(engine);
        self.end_if_editing(engine);
        let events = engine.drain_events();
        if self.active
            && let Some(action) = ActionKind::summarize(&events)
        {
            self.notify_action(action);
            self.check_completion(engine, Some(action));
        }
        Some(events)
    }

    /// Switch the engine's mode. Entering edit mode ends a running tutorial.
    pub fn switch_mode(&mut self, engine: &mut RaceEngine, mode: RaceMode) -> Result<(), SetupError> {
        if mode == RaceMode::Editing && self.active {
            self.end(engine);
        }
        engine.switch_mode(mode)
    }

    /// Drop tutorial state without touching the track.
    fn release(&mut self, engine: &mut RaceEngine) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.last_action = None;
        self.access = ControlAccess::All;
        self.highlight = None;
        engine.set_tutorial_active(false);
        tracing::info!(step = self.index, "Tutorial ended");
        true
    }

    /// The engine fell back to edit mode on its own (broken track). The
    /// tutorial cannot continue there; leave the engine in the editor.
    fn end_if_editing(&mut self, engine: &mut RaceEngine) {
        if self.active && engine.mode() == RaceMode::Editing {
            tracing::warn!(step = self.index, "Engine entered edit mode, leaving tutorial");
            self.release(engine);
        }
    }

    fn enter_step(&mut self, engine: &mut RaceEngine) {
        let Some(step) = self.steps.get(self.index) else {
            return;
        };
        self.access = step.access.clone();
        self.highlight = step.highlight;
        self.last_action = None;
        let (id, setup) = (step.id, step.setup);
        tracing::info!(step = id, index = self.index, "Tutorial step entered");
        if let Some(hook) = setup {
            hook(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecrace_core::events::AbilityKind;
    use vecrace_core::geometry::Vec2i;
    use vecrace_engine::config::RaceConfig;
    use vecrace_engine::test_helpers::settle;
    use vecrace_engine::track::TrackDefinition;

    fn started() -> (Tutorial, RaceEngine) {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        let mut tutorial = Tutorial::new();
        tutorial.start(&mut engine).unwrap();
        (tutorial, engine)
    }

    fn accelerate(dx: i32, dy: i32) -> RaceCommand {
        RaceCommand::Accelerate { dx, dy }
    }

    fn step_id(tutorial: &Tutorial) -> &'static str {
        tutorial.current_step().map_or("", |s| s.id)
    }

    #[test]
    fn start_seats_one_player_on_tutorial_map() {
        let (tutorial, engine) = started();
        assert!(tutorial.is_active());
        assert!(engine.tutorial_active());
        assert_eq!(engine.map().id, TUTORIAL_MAP_ID);
        assert_eq!(engine.players().len(), 1);
        assert_eq!(engine.players()[0].motion.position, GridPos::new(7, 7));
        assert_eq!(step_id(&tutorial), "welcome");
        assert!(!tutorial.allows(Some(Control::COAST)));
    }

    #[test]
    fn start_from_edit_mode_enters_racing() {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        engine.switch_mode(RaceMode::Editing).unwrap();
        let mut tutorial = Tutorial::new();
        tutorial.start(&mut engine).unwrap();
        assert_eq!(engine.mode(), RaceMode::Racing);
    }

    #[test]
    fn blocked_controls_do_nothing() {
        let (mut tutorial, mut engine) = started();
        assert!(tutorial.dispatch(&mut engine, &accelerate(0, -1)).is_none());
        assert!(tutorial.press_next(&mut engine));
        assert_eq!(step_id(&tutorial), "accelerate_up");

        assert!(tutorial.dispatch(&mut engine, &accelerate(1, 0)).is_none());
        assert!(
            tutorial
                .dispatch(&mut engine, &RaceCommand::ActivateAbility { index: 0 })
                .is_none()
        );
        assert_eq!(engine.players()[0].moves_made, 0);
        assert_eq!(step_id(&tutorial), "accelerate_up");
    }

    #[test]
    fn full_walkthrough() {
        let (mut tutorial, mut engine) = started();
        tutorial.press_next(&mut engine);

        tutorial.dispatch(&mut engine, &accelerate(0, -1)).unwrap();
        assert_eq!(step_id(&tutorial), "speed_display");
        assert_eq!(tutorial.highlight(), Some(Highlight::SpeedReadout));

        tutorial.dispatch(&mut engine, &accelerate(1, 0)).unwrap();
        assert_eq!(step_id(&tutorial), "vector_inertia");

        tutorial.dispatch(&mut engine, &accelerate(0, 0)).unwrap();
        assert_eq!(engine.players()[0].motion.position, GridPos::new(9, 4));
        assert_eq!(step_id(&tutorial), "intro_abilities");

        tutorial.dispatch(&mut engine, &accelerate(1, -1)).unwrap();
        assert_eq!(step_id(&tutorial), "use_insta_stop");

        let events = tutorial
            .dispatch(&mut engine, &RaceCommand::ActivateAbility { index: 0 })
            .unwrap();
        assert!(events.contains(&RaceEvent::AbilityUsed {
            player_id: 0,
            ability: AbilityKind::InstaStop,
        }));
        assert_eq!(step_id(&tutorial), "reach_finish");
        assert_eq!(tutorial.access(), &ControlAccess::All);

        engine.place_player(0, GridPos::new(21, 7));
        tutorial.dispatch(&mut engine, &accelerate(1, 0)).unwrap();
        assert_eq!(step_id(&tutorial), "tutorial_complete");

        assert!(tutorial.press_next(&mut engine));
        assert!(!tutorial.is_active());
        assert!(!engine.tutorial_active());
        assert_eq!(engine.map().id, DEFAULT_MAP_ID);
        assert_eq!(tutorial.access(), &ControlAccess::All);
        assert!(!engine.is_complete());
    }

    #[test]
    fn stalled_car_gets_speed_on_entry() {
        let (mut tutorial, mut engine) = started();
        tutorial.press_next(&mut engine);
        tutorial.dispatch(&mut engine, &accelerate(0, -1)).unwrap();
        tutorial.dispatch(&mut engine, &accelerate(1, 0)).unwrap();
        assert_eq!(step_id(&tutorial), "vector_inertia");

        // Re-enter the step with a stopped car.
        engine.player_mut(0).unwrap().motion.velocity = Vec2i::ZERO;
        tutorial.index = 3;
        tutorial.enter_step(&mut engine);
        assert_eq!(engine.players()[0].motion.velocity, Vec2i::new(1, -1));
    }

    #[test]
    fn crash_during_free_drive_does_not_auto_pass() {
        let (mut tutorial, mut engine) = started();
        tutorial.index = 6;
        tutorial.enter_step(&mut engine);
        assert_eq!(step_id(&tutorial), "reach_finish");

        engine.place_player(0, GridPos::new(9, 7));
        tutorial.dispatch(&mut engine, &accelerate(1, 0)).unwrap();
        assert!(engine.players()[0].crashed);
        assert_eq!(tutorial.last_action(), None);

        settle(&mut engine);
        let p = &engine.players()[0];
        assert!(!p.crashed);
        assert_eq!(p.motion.position, GridPos::new(2, 7));
        assert_eq!(step_id(&tutorial), "reach_finish");
    }

    #[test]
    fn editing_ends_the_tutorial() {
        let (mut tutorial, mut engine) = started();
        let to_editor = RaceCommand::SwitchMode {
            mode: RaceMode::Editing,
        };
        // Welcome only allows Next, so the editor button is disabled there.
        assert!(tutorial.dispatch(&mut engine, &to_editor).is_none());
        assert!(tutorial.is_active());

        tutorial.switch_mode(&mut engine, RaceMode::Editing).unwrap();
        assert!(!tutorial.is_active());
        assert_eq!(engine.mode(), RaceMode::Editing);
        assert_eq!(engine.map().id, DEFAULT_MAP_ID);
    }

    #[test]
    fn engine_falling_into_edit_mode_ends_the_tutorial() {
        let free_drive = Step {
            id: "free_drive",
            text: "",
            show_next: false,
            access: ControlAccess::All,
            highlight: None,
            is_complete: |player, _, _| player.finished,
            setup: None,
            cleanup: None,
        };
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        let mut tutorial = Tutorial::with_steps(vec![free_drive]);
        tutorial.start(&mut engine).unwrap();

        let broken = TrackDefinition {
            id: "broken".into(),
            name: String::new(),
            width: 4,
            height: 2,
            grid: Some(vec![vec![0]]),
            is_tutorial: false,
        };
        assert!(engine.load_map_data(&broken).is_err());
        assert_eq!(engine.mode(), RaceMode::Editing);

        tutorial.dispatch(&mut engine, &RaceCommand::RequestHint).unwrap();
        assert!(!tutorial.is_active());
        assert!(!engine.tutorial_active());
        assert_eq!(engine.mode(), RaceMode::Editing);
        assert_eq!(engine.map().id, "cleared");
        assert_eq!(tutorial.access(), &ControlAccess::All);
    }

    #[test]
    fn inactive_tutorial_passes_everything_through() {
        let mut engine = RaceEngine::with_config(RaceConfig::default());
        let mut tutorial = Tutorial::new();
        let events = tutorial.dispatch(&mut engine, &accelerate(1, 0)).unwrap();
        assert!(matches!(events[0], RaceEvent::Moved { .. }));
        assert!(!tutorial.press_next(&mut engine));
        assert!(!tutorial.check_completion(&mut engine, Some(ActionKind::NextClicked)));
    }
}
