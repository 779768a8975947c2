//! Headless match runner.
//!
//! Plays sessions to completion with a [`Pilot`] at the controls,
//! resolving upgrade offers as they come.

use battle_core::data::GameConfig;
use battle_core::error::GameError;
use battle_core::math::{ratio, Fixed};
use battle_core::progression::Outcome;
use battle_core::session::{Phase, Session};
use serde::{Deserialize, Serialize};

use crate::metrics::{MatchMetrics, MetricsCollector};
use crate::pilot::Pilot;

/// Ten minutes at 20 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 12_000;

/// Settings for one headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Hero id; the first roster entry when `None`.
    pub hero: Option<String>,
    /// Who drives the hero.
    pub pilot: Pilot,
    /// Ticks per simulated second.
    pub tick_rate: u16,
    /// Give up after this many ticks per match.
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hero: None,
            pilot: Pilot::skirmisher(),
            tick_rate: 20,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl RunConfig {
    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> Fixed {
        ratio(1, i32::from(self.tick_rate.max(1)))
    }
}

/// A run of consecutive levels with the same hero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignReport {
    /// Hero id.
    pub hero: String,
    /// Pilot preset name.
    pub pilot: String,
    /// One entry per level played, in order.
    pub levels: Vec<MatchMetrics>,
    /// Highest level won, 0 if none.
    pub highest_level_won: u32,
}

/// Create a session and pick the hero.
///
/// # Errors
///
/// Fails on an invalid config or an unknown hero id.
pub fn start_session(config: GameConfig, run: &RunConfig) -> Result<Session, GameError> {
    let mut session = Session::new(config)?;
    if session.phase() == Phase::HeroSelection {
        let id = run
            .hero
            .clone()
            .or_else(|| session.config().heroes.first().map(|h| h.id.clone()))
            .ok_or_else(|| GameError::InvalidState("hero roster is empty".to_string()))?;
        session.select_hero(&id)?;
    }
    Ok(session)
}

fn hero_name(session: &Session, run: &RunConfig) -> String {
    run.hero
        .clone()
        .or_else(|| session.config().heroes.first().map(|h| h.id.clone()))
        .unwrap_or_else(|| "default".to_string())
}

/// Play the current level until it ends or `run.max_ticks` pass.
///
/// # Errors
///
/// Fails if the session is waiting for hero selection, or if the pilot
/// makes a choice the session rejects.
pub fn play_level(session: &mut Session, run: &RunConfig) -> Result<MatchMetrics, GameError> {
    let hero = hero_name(session, run);
    let mut collector = MetricsCollector::new(session, &hero, &run.pilot.name);
    let dt = run.dt();

    while session.get_tick() < run.max_ticks {
        match session.phase() {
            Phase::Active => {
                let input = run.pilot.steer(session);
                let events = session.tick(dt, &input);
                collector.record(session, &events);
            }
            Phase::UpgradePaused => {
                let offer = session.pending_offer().cloned().ok_or(GameError::NoPendingOffer)?;
                let choice = run
                    .pilot
                    .choose(&offer)
                    .ok_or_else(|| GameError::InvalidState("empty upgrade offer".to_string()))?;
                tracing::debug!(threshold = offer.threshold, weapon = choice.key(), "Pilot took upgrade");
                session.resolve_upgrade(choice)?;
                collector.record_upgrade(session.get_tick(), offer.threshold, choice);
            }
            Phase::GameOver(_) => break,
            Phase::HeroSelection => {
                return Err(GameError::InvalidPhase {
                    expected: Phase::Active.name(),
                    actual: Phase::HeroSelection.name(),
                });
            }
        }
    }

    let metrics = collector.finish(session);
    tracing::info!(
        hero = %metrics.hero,
        pilot = %metrics.pilot,
        level = metrics.level,
        outcome = metrics.outcome.map_or("timeout", Outcome::name),
        ticks = metrics.ticks,
        "Level finished"
    );
    Ok(metrics)
}

/// Play one level-1 match.
///
/// # Errors
///
/// See [`start_session`] and [`play_level`].
pub fn run_match(config: GameConfig, run: &RunConfig) -> Result<MatchMetrics, GameError> {
    let mut session = start_session(config, run)?;
    play_level(&mut session, run)
}

/// Keep playing while the hero wins, up to `max_levels` levels.
///
/// # Errors
///
/// See [`start_session`] and [`play_level`].
pub fn run_campaign(
    config: GameConfig,
    run: &RunConfig,
    max_levels: u32,
) -> Result<CampaignReport, GameError> {
    let mut session = start_session(config, run)?;
    let mut report = CampaignReport {
        hero: hero_name(&session, run),
        pilot: run.pilot.name.clone(),
        ..CampaignReport::default()
    };

    for _ in 0..max_levels.max(1) {
        let metrics = play_level(&mut session, run)?;
        let won = metrics.outcome == Some(Outcome::Victory);
        if won {
            report.highest_level_won = metrics.level;
        }
        report.levels.push(metrics);
        if !won || report.levels.len() as u32 >= max_levels {
            break;
        }
        session.next_level()?;
    }

    Ok(report)
}
