pub mod abilities;
pub mod collision;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod maps;
pub mod player;
pub mod scoring;
pub mod snapshot;
pub mod track;

pub use engine::RaceEngine;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::time::Duration;

    use crate::config::RaceConfig;
    use crate::engine::RaceEngine;
    use crate::track::Track;

    /// Host frame length used by tests.
    pub const FRAME: Duration = Duration::from_millis(20);

    /// Narrow box: start top-left, finish bottom-right.
    pub const OPEN_ROWS: &[&str] = &[
        "##########",
        "#S.......#",
        "#........#",
        "#.......F#",
        "##########",
    ];

    /// Wide open field with room for area effects.
    pub const WIDE_ROWS: &[&str] = &[
        "################",
        "#S.............#",
        "#..............#",
        "#..............#",
        "#..............#",
        "#.............F#",
        "################",
    ];

    /// Build a track from ASCII rows (`#` wall, `.` empty, `S` start, `F` finish).
    pub fn track_from(rows: &[&str]) -> Track {
        Track::from_rows(rows).unwrap_or_else(|e| panic!("bad test track: {e}"))
    }

    /// Racing engine with `seats` players on an ASCII track and default config.
    pub fn engine_on(rows: &[&str], seats: usize) -> RaceEngine {
        engine_with(RaceConfig::default(), rows, seats)
    }

    pub fn engine_with(config: RaceConfig, rows: &[&str], seats: usize) -> RaceEngine {
        RaceEngine::with_track(config, track_from(rows), seats)
    }

    /// Step the engine through `n` host frames.
    pub fn run_frames(engine: &mut RaceEngine, n: usize) {
        for _ in 0..n {
            engine.frame(FRAME);
        }
    }

    /// Run frames until no crash reset is pending (bounded).
    pub fn settle(engine: &mut RaceEngine) {
        for _ in 0..1000 {
            if !engine.crash_reset_pending() {
                return;
            }
            engine.frame(FRAME);
        }
    }
}
