//! Batch campaign runner for balance testing.
//!
//! Plays every hero/pilot pairing in parallel using rayon and collects
//! the campaign reports.

use std::path::Path;
use std::time::Instant;

use battle_core::data::GameConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::BatchSummary;
use crate::pilot::Pilot;
use crate::runner::{run_campaign, run_match, CampaignReport, RunConfig, DEFAULT_MAX_TICKS};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Hero ids to play; empty means the whole roster.
    pub heroes: Vec<String>,
    /// Pilot presets to play.
    pub pilots: Vec<Pilot>,
    /// Levels per campaign.
    pub max_levels: u32,
    /// Tick limit per level.
    pub max_ticks: u64,
    /// Ticks per simulated second.
    pub tick_rate: u16,
    /// Worker threads (0 = rayon default).
    pub parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            heroes: Vec::new(),
            pilots: Pilot::presets(),
            max_levels: 3,
            max_ticks: DEFAULT_MAX_TICKS,
            tick_rate: 20,
            parallel: 0,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// One report per hero/pilot pairing.
    pub campaigns: Vec<CampaignReport>,
    /// Aggregate over every level played.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Pairings that failed to run.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// A pairing that could not be played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Hero id.
    pub hero: String,
    /// Pilot name.
    pub pilot: String,
    /// Error message.
    pub message: String,
}

/// Play every hero/pilot pairing.
pub fn run_batch(game: &GameConfig, config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    let heroes = if config.heroes.is_empty() {
        game.heroes.iter().map(|h| h.id.clone()).collect()
    } else {
        config.heroes.clone()
    };
    let jobs: Vec<(String, Pilot)> = heroes
        .iter()
        .flat_map(|hero| config.pilots.iter().map(move |p| (hero.clone(), p.clone())))
        .collect();

    info!(
        pairings = jobs.len(),
        max_levels = config.max_levels,
        max_ticks = config.max_ticks,
        "Starting batch"
    );

    let play = |(hero, pilot): &(String, Pilot)| {
        let run = RunConfig {
            hero: Some(hero.clone()),
            pilot: pilot.clone(),
            tick_rate: config.tick_rate,
            max_ticks: config.max_ticks,
        };
        run_campaign(game.clone(), &run, config.max_levels).map_err(|e| BatchError {
            hero: hero.clone(),
            pilot: pilot.name.clone(),
            message: e.to_string(),
        })
    };

    let outcomes: Vec<_> = match build_pool(config.parallel) {
        Some(pool) => pool.install(|| jobs.par_iter().map(play).collect()),
        None => jobs.par_iter().map(play).collect(),
    };

    let mut campaigns = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(report) => campaigns.push(report),
            Err(e) => {
                warn!(hero = %e.hero, pilot = %e.pilot, error = %e.message, "Pairing failed");
                errors.push(e);
            }
        }
    }

    let summary = BatchSummary::from_matches(campaigns.iter().flat_map(|c| c.levels.iter()));
    BatchResults {
        config,
        campaigns,
        summary,
        duration_seconds: start.elapsed().as_secs_f64(),
        errors,
    }
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(error = %e, "Could not build thread pool, using the global one");
            None
        }
    }
}

/// Play the same match `runs` times in parallel and compare final hashes.
pub fn verify_determinism(game: &GameConfig, run: &RunConfig, runs: u32) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs.max(2))
        .into_par_iter()
        .map(|_| run_match(game.clone(), run).ok().map(|m| m.final_state_hash))
        .collect();

    let deterministic = hashes.iter().all(Option::is_some) && hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(?hashes, "Runs diverged");
    }
    deterministic
}
