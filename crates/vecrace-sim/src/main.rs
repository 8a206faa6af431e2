use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use vecrace_engine::RaceEngine;
use vecrace_engine::command::RaceCommand;
use vecrace_engine::config::RaceConfig;
use vecrace_engine::maps;
use vecrace_engine::track::TrackDefinition;
use vecrace_tutorial::Tutorial;

const FRAME: Duration = Duration::from_micros(16_667);

/// Headless Vector Racer: replay a command script and print the final state.
#[derive(Debug, Parser)]
#[command(name = "vecrace-sim")]
struct Args {
    /// Built-in map id or path to a JSON map file.
    #[arg(long, default_value = maps::DEFAULT_MAP_ID)]
    map: String,
    /// JSON array of commands to replay.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Host frames (60 Hz) simulated after each command.
    #[arg(long, default_value_t = 1)]
    frames_per_command: u32,
    /// Run the script through the tutorial instead of a free race.
    #[arg(long)]
    tutorial: bool,
}

/// Script-only controls that are not race commands.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
enum HostCommand {
    TutorialNext,
    Wait { frames: u32 },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptEntry {
    Race(RaceCommand),
    Host(HostCommand),
}

fn load_map(engine: &mut RaceEngine, map: &str) -> Result<()> {
    let def = match maps::find_map(map) {
        Some(def) => def,
        None => {
            let json = std::fs::read_to_string(map).with_context(|| format!("reading map {map}"))?;
            TrackDefinition::from_json(&json).with_context(|| format!("parsing map {map}"))?
        },
    };
    engine
        .load_map_data(&def)
        .with_context(|| format!("loading map {}", def.id))
}

fn load_script(path: &Path) -> Result<Vec<ScriptEntry>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing script {}", path.display()))
}

fn run_frames(engine: &mut RaceEngine, n: u32) {
    for _ in 0..n {
        engine.frame(FRAME);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut engine = RaceEngine::with_config(RaceConfig::load());
    let mut tutorial = Tutorial::new();
    if args.tutorial {
        tutorial.start(&mut engine)?;
    } else {
        load_map(&mut engine, &args.map)?;
    }
    tracing::info!(map = %engine.map().id, players = engine.players().len(), "Simulation starting");

    let script = match &args.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    for entry in &script {
        match entry {
            ScriptEntry::Race(command) => match tutorial.dispatch(&mut engine, command) {
                Some(events) => {
                    for event in &events {
                        tracing::info!(?event, "Race event");
                    }
                },
                None => tracing::info!(?command, "Command blocked"),
            },
            ScriptEntry::Host(HostCommand::TutorialNext) => {
                tutorial.press_next(&mut engine);
            },
            ScriptEntry::Host(HostCommand::Wait { frames }) => run_frames(&mut engine, *frames),
        }
        run_frames(&mut engine, args.frames_per_command);
    }

    while engine.crash_reset_pending() {
        engine.frame(FRAME);
    }
    for event in engine.drain_events() {
        tracing::info!(?event, "Race event");
    }
    if let Some(step) = tutorial.current_step() {
        tracing::info!(step = step.id, "Tutorial still running");
    }

    println!("{}", engine.snapshot().to_json()?);
    Ok(())
}
