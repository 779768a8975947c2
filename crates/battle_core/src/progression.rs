//! Level difficulty, weapon unlocks and the coin thresholds that offer them.

use serde::{Deserialize, Serialize};

use crate::data::{DifficultyConfig, SpawnComposition, UnitStats, MAX_WAVE_UNITS};
use crate::math::{fixed_decimal_serde, Fixed};
use crate::team::Team;
use crate::weapon::WeaponKind;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The enemy base fell and the player base stands.
    Victory,
    /// The player base fell and the enemy base stands.
    Defeat,
    /// Both bases fell on the same tick.
    Draw,
}

impl Outcome {
    /// Decide the outcome from which bases are destroyed, if the match is over.
    #[must_use]
    pub const fn from_destroyed(player_down: bool, enemy_down: bool) -> Option<Self> {
        match (player_down, enemy_down) {
            (true, true) => Some(Self::Draw),
            (true, false) => Some(Self::Defeat),
            (false, true) => Some(Self::Victory),
            (false, false) => None,
        }
    }

    /// Lowercase name for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::Draw => "draw",
        }
    }
}

/// Enemy scaling for one level.
///
/// The player side is never scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty {
    level: u32,
    config: DifficultyConfig,
}

impl Difficulty {
    /// Difficulty for `level`; levels below 1 count as 1.
    #[must_use]
    pub fn new(level: u32, config: DifficultyConfig) -> Self {
        Self {
            level: level.max(1),
            config,
        }
    }

    /// The level this difficulty was built for.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    fn steps(&self) -> Fixed {
        Fixed::saturating_from_num(self.level - 1)
    }

    /// `1 + steps * step`, saturating for very high levels.
    fn grow(&self, step: Fixed) -> Fixed {
        Fixed::ONE.saturating_add(self.steps().saturating_mul(step))
    }

    /// Health multiplier applied to `team`'s units.
    #[must_use]
    pub fn health_scale(&self, team: Team) -> Fixed {
        match team {
            Team::Player => Fixed::ONE,
            Team::Enemy => self.grow(self.config.health_step),
        }
    }

    /// Wave-size multiplier applied to `team`'s spawns.
    #[must_use]
    pub fn count_scale(&self, team: Team) -> Fixed {
        match team {
            Team::Player => Fixed::ONE,
            Team::Enemy => self.grow(self.config.count_step),
        }
    }

    /// Stats for a `team` unit built from `base`.
    #[must_use]
    pub fn unit_stats(&self, team: Team, base: &UnitStats) -> UnitStats {
        match team {
            Team::Player => *base,
            Team::Enemy => base.with_health_scale(self.health_scale(team)),
        }
    }

    /// Wave composition for `team`.
    ///
    /// Enemy counts are scaled, rounded up and capped at
    /// [`MAX_WAVE_UNITS`]; an enemy wave always has at least one infantry.
    #[must_use]
    pub fn composition(&self, team: Team, base: &SpawnComposition) -> SpawnComposition {
        if team == Team::Player {
            return *base;
        }
        let scale = self.count_scale(team);
        let scaled = |count: u32| {
            Fixed::saturating_from_num(count)
                .saturating_mul(scale)
                .saturating_ceil()
                .to_num::<u32>()
                .min(MAX_WAVE_UNITS)
        };
        SpawnComposition {
            infantry: scaled(base.infantry).max(1),
            archer: scaled(base.archer),
            cavalry: scaled(base.cavalry),
        }
    }

    /// Per-level cadence multiplier, never below the configured floor.
    #[must_use]
    pub fn cadence_multiplier(&self) -> Fixed {
        Fixed::ONE
            .saturating_sub(self.steps().saturating_mul(self.config.cadence_step))
            .max(self.config.min_cadence_multiplier)
    }

    /// Spawn interval for `team`'s building.
    #[must_use]
    pub fn spawn_interval(&self, team: Team, base: Fixed) -> Fixed {
        match team {
            Team::Player => base,
            Team::Enemy => base
                .saturating_mul(self.config.enemy_spawn_interval_multiplier)
                .saturating_mul(self.cadence_multiplier()),
        }
    }

    /// First-wave delay for `team`'s building.
    #[must_use]
    pub fn first_spawn_time(&self, team: Team, base: Fixed) -> Fixed {
        match team {
            Team::Player => base,
            Team::Enemy => self.config.enemy_first_spawn_time.unwrap_or(base),
        }
    }
}

/// Weapon kinds unlocked this session. Only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockSet {
    sword: bool,
    bow: bool,
    lance: bool,
}

impl UnlockSet {
    /// Nothing unlocked.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sword: false,
            bow: false,
            lance: false,
        }
    }

    fn slot(&mut self, kind: WeaponKind) -> &mut bool {
        match kind {
            WeaponKind::Sword => &mut self.sword,
            WeaponKind::Bow => &mut self.bow,
            WeaponKind::Lance => &mut self.lance,
        }
    }

    /// Unlock `kind`. Returns `false` if it was already unlocked.
    pub fn unlock(&mut self, kind: WeaponKind) -> bool {
        let slot = self.slot(kind);
        let newly = !*slot;
        *slot = true;
        newly
    }

    /// Whether `kind` is unlocked.
    #[must_use]
    pub const fn contains(&self, kind: WeaponKind) -> bool {
        match kind {
            WeaponKind::Sword => self.sword,
            WeaponKind::Bow => self.bow,
            WeaponKind::Lance => self.lance,
        }
    }

    /// Kinds still locked, in sword, bow, lance order.
    #[must_use]
    pub fn locked(&self) -> Vec<WeaponKind> {
        WeaponKind::ALL
            .into_iter()
            .filter(|kind| !self.contains(*kind))
            .collect()
    }

    /// Unlocked kinds in sword, bow, lance order.
    #[must_use]
    pub fn unlocked(&self) -> Vec<WeaponKind> {
        WeaponKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }
}

/// A weapon choice waiting for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOffer {
    /// Threshold that triggered the offer.
    pub threshold: u32,
    /// Weapon kinds to choose from, never empty.
    pub options: Vec<WeaponKind>,
}

impl UpgradeOffer {
    /// Button labels for the upgrade panel, in option order.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.options.iter().map(|kind| kind.unlock_label()).collect()
    }
}

/// Coin bar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinProgress {
    /// Current balance.
    pub coins: u32,
    /// Threshold already consumed, or 0.
    pub last_threshold: u32,
    /// Next threshold, or `None` once all are consumed.
    pub next_threshold: Option<u32>,
    /// Fill ratio in `[0, 1]` between the two; full when none remain.
    #[serde(with = "fixed_decimal_serde")]
    pub ratio: Fixed,
}

/// Ascending coin thresholds, consumed one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeLadder {
    thresholds: Vec<u32>,
    index: usize,
}

impl UpgradeLadder {
    /// A ladder over `thresholds`, which must be ascending.
    #[must_use]
    pub fn new(thresholds: Vec<u32>) -> Self {
        Self {
            thresholds,
            index: 0,
        }
    }

    /// Number of thresholds consumed so far.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The next threshold to reach.
    #[must_use]
    pub fn next_threshold(&self) -> Option<u32> {
        self.thresholds.get(self.index).copied()
    }

    /// The most recently consumed threshold, or 0.
    #[must_use]
    pub fn last_threshold(&self) -> u32 {
        self.index
            .checked_sub(1)
            .and_then(|i| self.thresholds.get(i).copied())
            .unwrap_or(0)
    }

    /// The next threshold, if `coins` has reached it.
    #[must_use]
    pub fn due(&self, coins: u32) -> Option<u32> {
        self.next_threshold().filter(|threshold| coins >= *threshold)
    }

    /// Consume the next threshold.
    pub fn advance(&mut self) {
        if self.index < self.thresholds.len() {
            self.index += 1;
        }
    }

    /// Bar data for `coins`.
    #[must_use]
    pub fn progress(&self, coins: u32) -> CoinProgress {
        let last = self.last_threshold();
        let next = self.next_threshold();
        let ratio = match next {
            Some(next) if next > last => {
                let filled = Fixed::saturating_from_num(coins.saturating_sub(last));
                (filled / Fixed::saturating_from_num(next - last)).min(Fixed::ONE)
            }
            _ => Fixed::ONE,
        };
        CoinProgress {
            coins,
            last_threshold: last,
            next_threshold: next,
            ratio,
        }
    }
}
