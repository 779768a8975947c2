//! Headless battle runner.
//!
//! This binary plays matches without graphics and prints JSON reports.
//! Designed for balance checks and CI.
//!
//! # Usage
//!
//! ```bash
//! # One match, report on stdout
//! cargo run -p battle_headless -- run --hero zhangfei --pilot skirmisher
//!
//! # Keep going while the hero wins
//! cargo run -p battle_headless -- campaign --levels 5
//!
//! # Every hero/pilot pairing in parallel
//! cargo run -p battle_headless -- batch --output results/
//!
//! # Validate a config file
//! cargo run -p battle_headless -- validate assets/data/battle.ron
//! ```
//!
//! Reports go to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use battle_core::data::GameConfig;
use battle_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    config_loader::{load_config, load_or_default},
    pilot::Pilot,
    runner::{run_campaign, run_match, RunConfig, DEFAULT_MAX_TICKS},
};

#[derive(Parser)]
#[command(name = "battle_headless")]
#[command(about = "Headless base-siege battle runner for playtesting and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to assets/data/battle.ron, then built-in tuning)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct MatchArgs {
    /// Hero id (defaults to the first in the roster)
    #[arg(long)]
    hero: Option<String>,

    /// Pilot preset: idle, defender, raider or skirmisher
    #[arg(short, long, default_value = "skirmisher")]
    pilot: String,

    /// Ticks per simulated second
    #[arg(long, default_value = "20", value_parser = clap::value_parser!(u16).range(1..=120))]
    tick_rate: u16,

    /// Tick limit per level
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single level-1 match
    Run {
        #[command(flatten)]
        args: MatchArgs,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play consecutive levels until the hero loses
    Campaign {
        #[command(flatten)]
        args: MatchArgs,

        /// Maximum levels to play
        #[arg(short, long, default_value = "5")]
        levels: u32,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play every hero/pilot pairing in parallel
    Batch {
        /// Hero ids, comma separated (defaults to the whole roster)
        #[arg(long, value_delimiter = ',')]
        heroes: Vec<String>,

        /// Pilot presets, comma separated (defaults to all)
        #[arg(long, value_delimiter = ',')]
        pilots: Vec<String>,

        /// Levels per campaign
        #[arg(short, long, default_value = "3")]
        levels: u32,

        /// Tick limit per level
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Check that a config file parses and validates
    Validate {
        /// Config file to check
        path: PathBuf,
    },

    /// Play the same match several times and compare state hashes
    Verify {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of runs
        #[arg(short, long, default_value = "4")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Run { args, output } => {
            let game = game_config(cli.config.as_deref());
            let run = run_config(&args);
            match run_match(game, &run) {
                Ok(metrics) => emit(&metrics, output.as_deref()),
                Err(e) => fail(&format!("Match failed: {e}")),
            }
        }
        Commands::Campaign {
            args,
            levels,
            output,
        } => {
            let game = game_config(cli.config.as_deref());
            let run = run_config(&args);
            match run_campaign(game, &run, levels) {
                Ok(report) => {
                    eprintln!(
                        "Campaign: {} with {} won {} of {} level(s)",
                        report.hero,
                        report.pilot,
                        report.highest_level_won,
                        report.levels.len()
                    );
                    emit(&report, output.as_deref());
                }
                Err(e) => fail(&format!("Campaign failed: {e}")),
            }
        }
        Commands::Batch {
            heroes,
            pilots,
            levels,
            max_ticks,
            parallel,
            output,
        } => {
            let game = game_config(cli.config.as_deref());
            let pilots = if pilots.is_empty() {
                Pilot::presets()
            } else {
                pilots.iter().map(|name| parse_pilot(name)).collect()
            };
            cmd_batch(
                &game,
                BatchConfig {
                    heroes,
                    pilots,
                    max_levels: levels,
                    max_ticks,
                    parallel,
                    ..BatchConfig::default()
                },
                &output,
            );
        }
        Commands::Verify { args, runs } => {
            let game = game_config(cli.config.as_deref());
            let run = run_config(&args);
            tracing::info!(runs, pilot = %run.pilot.name, "Verifying determinism");
            if verify_determinism(&game, &run, runs) {
                eprintln!("PASS: All {runs} runs produced identical results");
            } else {
                fail("FAIL: Non-determinism detected!");
            }
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn game_config(path: Option<&Path>) -> GameConfig {
    load_or_default(path).unwrap_or_else(|e| fail(&format!("Failed to load config: {e}")))
}

fn parse_pilot(name: &str) -> Pilot {
    name.parse().unwrap_or_else(|e| fail(&format!("{e}")))
}

fn run_config(args: &MatchArgs) -> RunConfig {
    RunConfig {
        hero: args.hero.clone(),
        pilot: parse_pilot(&args.pilot),
        tick_rate: args.tick_rate,
        max_ticks: args.max_ticks,
    }
}

/// Pretty JSON to `output`, or stdout.
fn emit<T: Serialize>(report: &T, output: Option<&Path>) {
    let json = serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| fail(&format!("Failed to encode report: {e}")));
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                fail(&format!("Failed to write '{}': {e}", path.display()));
            }
            eprintln!("Report saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
}

fn cmd_validate(path: &Path) {
    match load_config(path) {
        Ok(config) => {
            eprintln!("OK: {}", path.display());
            eprintln!("  Map: {} x {}", config.world.width, config.world.height);
            eprintln!("  Heroes: {}", config.heroes.len());
            eprintln!("  Upgrade thresholds: {:?}", config.upgrade_thresholds);
        }
        Err(e) => fail(&format!("INVALID: {e}")),
    }
}

fn cmd_batch(game: &GameConfig, config: BatchConfig, output: &Path) {
    if let Err(e) = std::fs::create_dir_all(output) {
        fail(&format!(
            "FATAL: Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let results = run_batch(game, config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fail(&format!("FATAL: Failed to save results: {e}"));
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Campaigns: {}", results.campaigns.len());
    eprintln!("Levels played: {}", summary.matches);
    eprintln!(
        "Victories: {}  Defeats: {}  Draws: {}  Timeouts: {}",
        summary.victories, summary.defeats, summary.draws, summary.timeouts
    );
    eprintln!("Victory rate: {:.1}%", summary.victory_rate * 100.0);
    eprintln!("Duration: {:.1}s", results.duration_seconds);

    for campaign in &results.campaigns {
        let lost: u32 = campaign
            .levels
            .iter()
            .filter_map(|l| l.teams.get("player"))
            .map(|t| t.total_lost())
            .sum();
        eprintln!(
            "  {:<12} {:<11} highest level won: {}  soldiers lost: {}",
            campaign.hero, campaign.pilot, campaign.highest_level_won, lost
        );
    }

    if !results.errors.is_empty() {
        eprintln!("\nFAILURES:");
        for error in &results.errors {
            eprintln!("  {} / {}: {}", error.hero, error.pilot, error.message);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}
