pub mod controls;
pub mod sequencer;
pub mod steps;

pub use controls::{Control, ControlAccess, Highlight};
pub use sequencer::{Tutorial, TutorialError};
pub use steps::Step;
