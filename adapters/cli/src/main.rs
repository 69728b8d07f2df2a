#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Bat Rounds games headlessly.

mod config;
mod simulation;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use bat_rounds_core::{GameConfig, GameMode};
use bat_rounds_system_sampling::stream_rng;
use bat_rounds_system_scheduler::Scheduler;
use clap::{Parser, Subcommand, ValueEnum};
use simulation::{PlayerOptions, Summary};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PLAYER_STREAM: &str = "player";

#[derive(Debug, Parser)]
#[command(name = "bat-rounds", version, about = "Headless Bat Rounds round scheduler")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Play a full game with a seeded simulated player and print every event
    Simulate(SimulateArgs),
    /// Print the built-in configuration of a mode as TOML
    PrintConfig {
        /// Mode whose defaults are printed
        #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
        mode: ModeArg,
    },
}

#[derive(Debug, clap::Args)]
struct SimulateArgs {
    /// Mode to play when no config file is given
    #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
    mode: ModeArg,

    /// TOML config file; overrides --mode
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed overriding the configured one
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that the player stuns the actor it aims at
    #[arg(long, default_value_t = 0.85)]
    hit_chance: f64,

    /// Resolutions after which the run stops even if the game is not over
    #[arg(long, default_value_t = 5_000)]
    max_events: u32,

    /// Resolutions a dropped debuff stays active for
    #[arg(long, default_value_t = 6)]
    debuff_duration: u32,

    /// Emit events and the summary as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Classic,
    Cooperative,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Classic => GameMode::Classic,
            ModeArg::Cooperative => GameMode::Cooperative,
        }
    }
}

/// Entry point for the Bat Rounds command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Simulate(args) => simulate(args),
        CliCommand::PrintConfig { mode } => {
            print!("{}", config::render_default(mode.into())?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut game = match &args.config {
        Some(path) => config::load(path)?,
        None => GameConfig::for_mode(args.mode.into()),
    };
    if let Some(seed) = args.seed {
        game.seed = seed;
    }
    info!(mode = ?game.mode, seed = game.seed, "simulation_started");

    let mut scheduler = Scheduler::new(&game).context("failed to build scheduler")?;
    let mut rng = stream_rng(game.seed, PLAYER_STREAM);
    let options = PlayerOptions {
        hit_chance: args.hit_chance,
        max_resolutions: args.max_events,
        debuff_duration: args.debuff_duration,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = simulation::play(&mut scheduler, options, &mut rng, |event| {
        if args.json {
            serde_json::to_writer(&mut out, event).context("failed to encode event")?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", simulation::describe(event))?;
        }
        Ok(())
    })?;

    write_summary(&mut out, &summary, args.json)?;
    out.flush().context("failed to flush stdout")
}

fn write_summary(out: &mut impl Write, summary: &Summary, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, summary).context("failed to encode summary")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{} after {} resolutions ({} stunned, {} fled, {} modifier drops), reached round {}",
        if summary.game_over {
            "game over"
        } else {
            "stopped"
        },
        summary.resolutions,
        summary.stuns,
        summary.flees,
        summary.modifier_drops,
        summary.rounds_reached,
    )?;
    Ok(())
}
