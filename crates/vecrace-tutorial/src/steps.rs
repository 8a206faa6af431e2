use vecrace_core::events::{AbilityKind, ActionKind};
use vecrace_core::geometry::Vec2i;
use vecrace_engine::RaceEngine;
use vecrace_engine::player::Player;

use crate::controls::{Control, ControlAccess, Highlight};

/// Completion predicate: the tutorial player, the engine, and the most recent
/// classified action.
pub type StepCheck = fn(&Player, &RaceEngine, Option<ActionKind>) -> bool;

/// Entry or exit hook run against the engine.
pub type StepHook = fn(&mut RaceEngine);

/// One didactic step of the tutorial.
#[derive(Debug, Clone)]
pub struct Step {
    pub id: &'static str,
    pub text: &'static str,
    /// Whether the host shows the Next button for this step.
    pub show_next: bool,
    pub access: ControlAccess,
    pub highlight: Option<Highlight>,
    pub is_complete: StepCheck,
    pub setup: Option<StepHook>,
    pub cleanup: Option<StepHook>,
}

impl Step {
    fn new(id: &'static str, text: &'static str, is_complete: StepCheck) -> Self {
        Self {
            id,
            text,
            show_next: false,
            access: ControlAccess::All,
            highlight: None,
            is_complete,
            setup: None,
            cleanup: None,
        }
    }

    fn with_next(mut self) -> Self {
        self.show_next = true;
        self
    }

    /// Restrict the step to `controls`. The tutorial panel stays usable.
    fn allow(mut self, controls: impl IntoIterator<Item = Control>) -> Self {
        self.access =
            ControlAccess::only(controls.into_iter().chain([Control::TutorialPanel]));
        self
    }

    fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    fn on_enter(mut self, hook: StepHook) -> Self {
        self.setup = Some(hook);
        self
    }
}

const UP: Control = Control::Accelerate { dx: 0, dy: -1 };
const RIGHT: Control = Control::Accelerate { dx: 1, dy: 0 };
const UP_RIGHT: Control = Control::Accelerate { dx: 1, dy: -1 };
const INSTA_STOP: Control = Control::Ability {
    kind: AbilityKind::InstaStop,
};

/// The built-in eight-step walkthrough.
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new(
            "welcome",
            "Welcome to Vector Racer! This tutorial covers the basics. Use the \
             acceleration grid to move your car. Click Next to begin.",
            |_, _, action| action == Some(ActionKind::NextClicked),
        )
        .with_next()
        .allow([Control::TutorialNext]),
        Step::new(
            "accelerate_up",
            "Let's move! Click the Up arrow to move one step north.",
            moved_north,
        )
        .allow([UP])
        .highlight(Highlight::Control { control: UP }),
        Step::new(
            "speed_display",
            "Good! Your speed (X, Y) has updated, and the small vector shows \
             your speed and direction. Now accelerate Right.",
            |player, _, _| player.motion.velocity.dx > 0,
        )
        .allow([RIGHT])
        .highlight(Highlight::SpeedReadout),
        Step::new(
            "vector_inertia",
            "You now have speed on both axes. Each turn the car moves by its \
             current speed. Click Coast to keep going without accelerating.",
            coasted,
        )
        .allow([Control::COAST])
        .highlight(Highlight::VelocityVector)
        .on_enter(|engine| ensure_moving(engine, Vec2i::new(1, -1))),
        Step::new(
            "intro_abilities",
            "Your car has special abilities with limited charges. Let's try \
             Insta-Stop. First, accelerate to pick up some speed.",
            |player, _, _| !player.motion.velocity.is_zero(),
        )
        .allow(Control::acceleration_grid())
        .highlight(Highlight::Control { control: UP_RIGHT })
        .on_enter(recharge_abilities),
        Step::new(
            "use_insta_stop",
            "Now that you're moving, click Insta-Stop to halt immediately.",
            stopped_with_insta_stop,
        )
        .allow([INSTA_STOP])
        .highlight(Highlight::Control {
            control: INSTA_STOP,
        })
        .on_enter(|engine| ensure_moving(engine, Vec2i::new(1, 1))),
        Step::new(
            "reach_finish",
            "Excellent! You've learned movement and an ability. Now drive to \
             the finish line.",
            |player, _, _| player.finished,
        ),
        Step::new(
            "tutorial_complete",
            "Tutorial complete! Explore other maps from the selector or try \
             the track editor. Click Finish Tutorial.",
            |_, _, action| action == Some(ActionKind::NextClicked),
        )
        .with_next()
        .allow([Control::TutorialNext, Control::MapSelector, Control::EditorMode]),
    ]
}

fn moved_north(player: &Player, _: &RaceEngine, _: Option<ActionKind>) -> bool {
    let north = player
        .motion
        .last_step()
        .is_some_and(|step| step.dy < 0);
    north && player.motion.velocity.dy < 0
}

fn coasted(player: &Player, engine: &RaceEngine, action: Option<ActionKind>) -> bool {
    action == Some(ActionKind::Accelerated)
        && engine.last_acceleration() == Some(Vec2i::ZERO)
        && player.motion.last_step().is_some_and(|step| !step.is_zero())
}

fn stopped_with_insta_stop(player: &Player, engine: &RaceEngine, action: Option<ActionKind>) -> bool {
    action == Some(ActionKind::AbilityUsed)
        && engine.last_ability_used() == Some(AbilityKind::InstaStop)
        && player.motion.velocity.is_zero()
}

/// Give a stalled tutorial car some speed so the next lesson has something
/// to work with.
fn ensure_moving(engine: &mut RaceEngine, velocity: Vec2i) {
    if let Some(player) = engine.player_mut(0)
        && player.motion.velocity.is_zero()
    {
        player.motion.velocity = velocity;
        tracing::debug!(?velocity, "Tutorial car given speed");
    }
}

fn recharge_abilities(engine: &mut RaceEngine) {
    if let Some(player) = engine.player_mut(0) {
        for ability in &mut player.abilities {
            ability.reset_charges();
        }
    }
}
