//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] watches the [`TickEvents`] of one match and
//! folds them into a serializable [`MatchMetrics`] report.

use std::collections::BTreeMap;

use battle_core::combat::CombatEvent;
use battle_core::components::EntityId;
use battle_core::progression::Outcome;
use battle_core::session::{Session, TickEvents};
use battle_core::team::Team;
use battle_core::weapon::WeaponKind;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Hero id.
    pub hero: String,
    /// Pilot preset name.
    pub pilot: String,
    /// Level played.
    pub level: u32,
    /// How the match ended; `None` if it hit the tick limit.
    pub outcome: Option<Outcome>,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub seconds: f64,
    /// Coin balance at the end.
    pub coins: u32,
    /// Weapon offers taken, in order.
    pub upgrades: Vec<UpgradeRecord>,
    /// Whether the hero was still alive at the end.
    pub hero_alive: bool,
    /// Per-team numbers, keyed `"player"` and `"enemy"`.
    pub teams: BTreeMap<String, TeamMetrics>,
    /// Final session state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// One resolved upgrade offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRecord {
    /// Tick the offer opened on.
    pub tick: u64,
    /// Threshold reached.
    pub threshold: u32,
    /// Weapon taken.
    pub choice: WeaponKind,
}

/// Metrics for one team in a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMetrics {
    /// Soldiers produced by waves, by archetype.
    pub units_spawned: BTreeMap<String, u32>,
    /// Soldiers lost, by archetype.
    pub units_lost: BTreeMap<String, u32>,
    /// Total damage dealt.
    pub damage_dealt: u64,
    /// Total damage taken.
    pub damage_taken: u64,
    /// Arrows loosed.
    pub arrows_launched: u32,
    /// Base health at the end.
    pub base_health: u32,
}

impl TeamMetrics {
    /// Total soldiers lost.
    #[must_use]
    pub fn total_lost(&self) -> u32 {
        self.units_lost.values().sum()
    }
}

/// Folds tick events into [`MatchMetrics`].
///
/// Entities are swept once they die, so the collector remembers every
/// team it has seen to attribute later events.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: MatchMetrics,
    teams: BTreeMap<EntityId, Team>,
}

impl MetricsCollector {
    /// Start collecting for a freshly set-up session.
    #[must_use]
    pub fn new(session: &Session, hero: &str, pilot: &str) -> Self {
        let mut collector = Self {
            metrics: MatchMetrics {
                hero: hero.to_string(),
                pilot: pilot.to_string(),
                level: session.level(),
                ..MatchMetrics::default()
            },
            teams: BTreeMap::new(),
        };
        for team in Team::ALL {
            collector
                .metrics
                .teams
                .insert(team.short_name().to_string(), TeamMetrics::default());
        }
        collector.learn(session, session.entities().sorted_ids());
        collector
    }

    fn learn(&mut self, session: &Session, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            if let Some(team) = session.entities().get(id).and_then(|e| e.team) {
                self.teams.insert(id, team);
            }
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut TeamMetrics {
        self.metrics
            .teams
            .entry(team.short_name().to_string())
            .or_default()
    }

    /// Record one tick's events. Call right after [`Session::tick`].
    pub fn record(&mut self, session: &Session, events: &TickEvents) {
        self.learn(session, events.spawned.iter().copied());
        for id in &events.spawned {
            let Some(entity) = session.entities().get(*id) else {
                continue;
            };
            if let Some(team) = entity.team {
                *self
                    .team_mut(team)
                    .units_spawned
                    .entry(entity.archetype.name().to_string())
                    .or_default() += 1;
            }
        }

        for event in &events.combat {
            match *event {
                CombatEvent::DamageDealt {
                    attacker,
                    target,
                    damage,
                } => {
                    if let Some(team) = self.teams.get(&attacker).copied() {
                        self.team_mut(team).damage_dealt += u64::from(damage);
                    }
                    if let Some(team) = self.teams.get(&target).copied() {
                        self.team_mut(team).damage_taken += u64::from(damage);
                    }
                }
                CombatEvent::ProjectileLaunched { source, .. } => {
                    if let Some(team) = self.teams.get(&source).copied() {
                        self.team_mut(team).arrows_launched += 1;
                    }
                }
                CombatEvent::Killed {
                    archetype,
                    team: Some(team),
                    ..
                } if archetype.is_unit() => {
                    *self
                        .team_mut(team)
                        .units_lost
                        .entry(archetype.name().to_string())
                        .or_default() += 1;
                }
                _ => {}
            }
        }
    }

    /// Record a resolved upgrade.
    pub fn record_upgrade(&mut self, tick: u64, threshold: u32, choice: WeaponKind) {
        self.metrics.upgrades.push(UpgradeRecord {
            tick,
            threshold,
            choice,
        });
    }

    /// Close the report with the session's final state.
    #[must_use]
    pub fn finish(mut self, session: &Session) -> MatchMetrics {
        for building in session.building_views() {
            self.team_mut(building.team).base_health = building.health;
        }
        self.metrics.outcome = session.outcome();
        self.metrics.ticks = session.get_tick();
        self.metrics.seconds = session.elapsed().to_num::<f64>();
        self.metrics.coins = session.coins();
        self.metrics.hero_alive = session
            .hero_id()
            .and_then(|id| session.entities().get(id))
            .is_some_and(|e| e.is_alive());
        self.metrics.final_state_hash = session.state_hash();
        self.metrics
    }
}

/// Aggregate numbers over many matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub matches: u32,
    /// Matches won.
    pub victories: u32,
    /// Matches lost.
    pub defeats: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Matches stopped at the tick limit.
    pub timeouts: u32,
    /// Victories over matches.
    pub victory_rate: f64,
    /// Mean ticks per match.
    pub average_ticks: f64,
    /// Victories per hero id.
    pub victories_by_hero: BTreeMap<String, u32>,
    /// Victories per pilot.
    pub victories_by_pilot: BTreeMap<String, u32>,
}

impl BatchSummary {
    /// Summarize a set of matches.
    #[must_use]
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a MatchMetrics>) -> Self {
        let mut summary = Self::default();
        let mut total_ticks = 0u64;

        for m in matches {
            summary.matches += 1;
            total_ticks += m.ticks;
            match m.outcome {
                Some(Outcome::Victory) => {
                    summary.victories += 1;
                    *summary.victories_by_hero.entry(m.hero.clone()).or_default() += 1;
                    *summary.victories_by_pilot.entry(m.pilot.clone()).or_default() += 1;
                }
                Some(Outcome::Defeat) => summary.defeats += 1,
                Some(Outcome::Draw) => summary.draws += 1,
                None => summary.timeouts += 1,
            }
        }

        if summary.matches > 0 {
            let n = f64::from(summary.matches);
            summary.victory_rate = f64::from(summary.victories) / n;
            summary.average_ticks = total_ticks as f64 / n;
        }
        summary
    }
}
